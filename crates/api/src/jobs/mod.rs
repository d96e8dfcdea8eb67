//! Background job scheduler and job implementations.

mod scheduler;
mod sweep_groups;

pub use scheduler::{Job, JobFrequency, JobScheduler};
pub use sweep_groups::ExpiredGroupSweepJob;
