//! Background jobs for marknest.
//!
//! Trash retention sweeps run once a day at configured times:
//!
//! - **Scheduler**: daily triggers computed from `HH:MM` times
//! - **Run lock**: a trigger is skipped while the previous run is in progress
//! - **Executor**: [`TrashSweepExecutor`] drives the core trash service

pub mod executor;
pub mod scheduler;

pub use executor::TrashSweepExecutor;
pub use scheduler::{
    DailyAt, JobExecutor, JobRun, RunGuard, RunLock, Schedule, ScheduledJob, run_job,
    run_scheduler,
};
