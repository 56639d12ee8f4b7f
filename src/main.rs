use byte_pool::PoolInner;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::{Duration, Instant};
use tokio::runtime::Builder;
use tracing_subscriber::EnvFilter;


fn main(){
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let rt = Builder::new_multi_thread()
    .enable_all()
    .build()
    .unwrap();

    rt.block_on(async{
        let processed = Arc::new(AtomicUsize::new(0));
        let counter = processed.clone();

        let now = Instant::now();
        let pool = PoolInner::new("demo", move |buf: Vec<u8>| {
            let _checksum = buf.iter().fold(0u64, |acc, b| acc.wrapping_add(*b as u64));
            counter.fetch_add(1, Ordering::Relaxed);
        }, num_cpus::get());

        let total = 1_000_000usize;
        for i in 0..total {
            pool.process((i as u64).to_le_bytes().to_vec()).unwrap();
        }

        while processed.load(Ordering::Relaxed) < total {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        pool.shutdown().unwrap();

        println!("workers: {}", pool.count());
        println!("processed: {}", processed.load(Ordering::Relaxed));
        println!("elapsed: {:?}", now.elapsed());
    });


}
