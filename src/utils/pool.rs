use crate::error::Result;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::thread;

/// Upper bound on worker threads regardless of host size.
pub const MAX_WORKERS: usize = 64;

/// Worker count used when none is configured.
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_WORKERS)
}

/// Build the bounded pool that per-pixel passes run on.
///
/// `workers` is clamped to `1..=MAX_WORKERS`.
pub fn build_pool(workers: Option<usize>) -> Result<ThreadPool> {
    let workers = workers
        .unwrap_or_else(default_worker_count)
        .clamp(1, MAX_WORKERS);
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|index| format!("pixel-worker-{index}"))
        .build()?;
    Ok(pool)
}
