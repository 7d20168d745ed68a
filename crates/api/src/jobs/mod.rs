//! Background job scheduler and job implementations.

mod cleanup_codes;
mod pool_metrics;
mod scheduler;

pub use cleanup_codes::CleanupCodesJob;
pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{Job, JobFrequency, JobScheduler};
