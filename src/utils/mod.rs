//! Utility functions for seeding, worker pools and tabular export

pub mod frame_export;
pub mod misc;
pub mod pool;

// Re-export commonly used utility functions for convenience
pub use misc::*;
pub use pool::{MAX_WORKERS, build_pool, default_worker_count};
