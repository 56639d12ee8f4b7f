#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub workers: usize,
    pub idle_workers: usize,
    pub queued_jobs: usize,
    pub processed_jobs: usize,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.workers == 0 {
            return 0.0;
        }
        (self.workers - self.idle_workers.min(self.workers)) as f64 / self.workers as f64
    }

    pub fn queue_pressure(&self) -> f64 {
        self.queued_jobs as f64
    }
}
