use super::{
    errors::PoolError,
    model::PoolMetrics,
};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};
use crossbeam::deque::Injector;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};


/// Конфигурация пула воркеров
#[derive(Debug, Clone)]
pub struct Config {
    pub initial_workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_workers: num_cpus::get(),
        }
    }
}


pub type Pool = Arc<PoolInner>;

/// Функция обработки одного байтового буфера
pub type ProcessFn = Box<dyn Fn(Vec<u8>) + Send + Sync + 'static>;

#[inline(always)]
fn unlikely(b: bool) -> bool {
    #[cold]
    fn cold() {}
    if !b { cold() }
    b
}

/// Задание в общей очереди: буфер на обработку либо сигнал
/// остановки для одного воркера
enum Job {
    Task(Vec<u8>),
    StopOne,
}

/// Динамически расширяемый пул воркеров для обработки байтовых буферов
///
/// Все воркеры читают одну общую MPMC-очередь. Каждое задание достаётся
/// ровно одному воркеру. Счётчик живых воркеров инкрементируется
/// синхронно в [`PoolInner::start`] и декрементируется при выходе воркера,
/// поэтому [`PoolInner::count`] возвращает снимок без гарантий
/// относительно ещё не завершившихся выходов.
pub struct PoolInner {
    name: String,
    handler: ProcessFn,
    inject: Injector<Job>,
    notify: Notify,
    shutdown_token: CancellationToken,
    closed: AtomicBool,
    workers: AtomicUsize,
    idle_workers: AtomicUsize,
    queued_jobs: AtomicUsize,
    processed_jobs: AtomicUsize,
}

// Декремент счётчика воркеров при любом выходе из цикла,
// включая панику в обработчике
struct CountGuard<'a>(&'a AtomicUsize);

impl Drop for CountGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Release);
    }
}

impl PoolInner {
    /// Создаёт пул с именем (только для диагностики), обработчиком и
    /// стартовым числом воркеров. При `initial_workers == 0` пул пуст:
    /// буферы копятся в очереди, пока не будет вызван [`PoolInner::start`].
    pub fn new<F>(name: impl Into<String>, handler: F, initial_workers: usize) -> Pool
    where
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        Self::with_config(name, handler, Config { initial_workers })
    }

    pub fn with_config<F>(name: impl Into<String>, handler: F, config: Config) -> Pool
    where
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        let pool = Arc::new(PoolInner {
            name: name.into(),
            handler: Box::new(handler),
            inject: Injector::new(),
            notify: Notify::new(),
            shutdown_token: CancellationToken::new(),
            closed: AtomicBool::new(false),
            workers: AtomicUsize::new(0),
            idle_workers: AtomicUsize::new(0),
            queued_jobs: AtomicUsize::new(0),
            processed_jobs: AtomicUsize::new(0),
        });

        // Запускаем стартовых воркеров
        for _ in 0..config.initial_workers {
            pool.start();
        }

        pool
    }

    #[inline(always)]
    fn push_job(&self, job: Job) -> Result<(), PoolError> {
        if unlikely(self.closed.load(Ordering::Acquire)) {
            return Err(PoolError::Closed);
        }
        self.queued_jobs.fetch_add(1, Ordering::Relaxed);
        self.inject.push(job);

        if unlikely(self.idle_workers.load(Ordering::Relaxed) > 0) {
            self.notify.notify_one();
        }
        Ok(())
    }

    /// Отдаёт буфер на обработку пулу. Не блокирует вызывающего:
    /// буфер встаёт в очередь и достанется первому свободному воркеру.
    /// Порядок потребления относительно других вызовов не гарантируется.
    ///
    /// # Errors
    ///
    /// [`PoolError::Closed`] после [`PoolInner::shutdown`].
    pub fn process(&self, buffer: Vec<u8>) -> Result<(), PoolError> {
        self.push_job(Job::Task(buffer))
    }

    /// Добавляет одного воркера. Счётчик увеличивается до запуска задачи,
    /// так что [`PoolInner::count`] сразу после вызова видит добавление.
    pub fn start(self: &Arc<Self>) {
        self.workers.fetch_add(1, Ordering::Release);
        let pool = Arc::clone(self);
        tokio::spawn(async move {
            pool.worker_loop().await;
        });
    }

    /// Убирает одного воркера: в общую очередь встаёт сигнал остановки,
    /// его заберёт и выполнит ровно один воркер (не обязательно последний
    /// запущенный). Если живых воркеров нет, сигнал лежит в очереди и
    /// поглотит следующий [`PoolInner::start`].
    ///
    /// # Errors
    ///
    /// [`PoolError::Closed`] после [`PoolInner::shutdown`].
    pub fn drop_worker(&self) -> Result<(), PoolError> {
        self.push_job(Job::StopOne)
    }

    /// Однократная остановка пула. Новые `process`/`drop_worker`
    /// отклоняются, все воркеры завершаются: свободные просыпаются сразу,
    /// занятые дорабатывают текущий буфер и выходят, не беря новых заданий.
    /// Завершения воркеров метод не ждёт.
    ///
    /// # Errors
    ///
    /// [`PoolError::Closed`] при повторном вызове.
    pub fn shutdown(&self) -> Result<(), PoolError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(PoolError::Closed);
        }
        debug!(pool = %self.name, "shutting down worker pool");
        self.shutdown_token.cancel();
        Ok(())
    }

    /// Текущее число живых воркеров (снимок)
    #[inline]
    pub fn count(&self) -> usize {
        self.workers.load(Ordering::Acquire)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            workers: self.workers.load(Ordering::Relaxed),
            idle_workers: self.idle_workers.load(Ordering::Relaxed),
            queued_jobs: self.queued_jobs.load(Ordering::Relaxed),
            processed_jobs: self.processed_jobs.load(Ordering::Relaxed),
        }
    }

    async fn worker_loop(&self) {
        trace!(pool = %self.name, "worker started");
        let _guard = CountGuard(&self.workers);

        'outer: loop {
            if self.shutdown_token.is_cancelled() {
                break;
            }

            let job = self.inject.steal().success().map(|j| {
                self.queued_jobs.fetch_sub(1, Ordering::Relaxed);
                j
            });

            match job {
                Some(Job::Task(buffer)) => {
                    (self.handler)(buffer);
                    self.processed_jobs.fetch_add(1, Ordering::Relaxed);
                }
                Some(Job::StopOne) => {
                    trace!(pool = %self.name, "worker taking stop signal");
                    break;
                }
                None => {
                    self.idle_workers.fetch_add(1, Ordering::Release);

                    for _ in 0..2 {
                        if !self.inject.is_empty() {
                            self.idle_workers.fetch_sub(1, Ordering::Acquire);
                            continue 'outer;
                        }
                        std::hint::spin_loop();
                    }

                    tokio::select! {
                        _ = self.notify.notified() => {
                            self.idle_workers.fetch_sub(1, Ordering::Acquire);
                        }
                        _ = self.shutdown_token.cancelled() => {
                            self.idle_workers.fetch_sub(1, Ordering::Acquire);
                            break 'outer;
                        }
                    }
                }
            }
        }

        trace!(pool = %self.name, "worker stopped");
    }
}
