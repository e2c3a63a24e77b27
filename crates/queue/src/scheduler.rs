//! Daily scheduled jobs.

#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use marknest_common::{AppError, AppResult, SchedulerConfig, TrashConfig};
use marknest_core::SweepReport;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

/// Scheduled job types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledJob {
    /// Purge documents trashed longer than the retention window.
    SweepDocuments { retention_days: u32 },
    /// Purge folder trees trashed longer than the retention window.
    SweepFolders { retention_days: u32 },
}

impl ScheduledJob {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SweepDocuments { .. } => "documents:cleanup-trashed",
            Self::SweepFolders { .. } => "folders:cleanup-trashed",
        }
    }
}

/// A time of day (UTC) a job runs at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyAt(NaiveTime);

impl DailyAt {
    #[must_use]
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// First occurrence strictly after `now`.
    #[must_use]
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.0).and_utc();
        if today > now {
            today
        } else {
            today + TimeDelta::days(1)
        }
    }

    /// How long to sleep from `now` until the next occurrence.
    #[must_use]
    pub fn delay_from(&self, now: DateTime<Utc>) -> Duration {
        (self.next_after(now) - now).to_std().unwrap_or_default()
    }
}

impl FromStr for DailyAt {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self)
            .map_err(|_| AppError::Config(format!("invalid time of day '{s}', expected HH:MM")))
    }
}

impl fmt::Display for DailyAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// Resolved schedule: when each sweep runs and what it purges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub documents_at: DailyAt,
    pub folders_at: DailyAt,
    pub document_retention_days: u32,
    pub folder_retention_days: u32,
}

impl Schedule {
    pub fn from_config(scheduler: &SchedulerConfig, trash: &TrashConfig) -> AppResult<Self> {
        Ok(Self {
            documents_at: scheduler.documents_at.parse()?,
            folders_at: scheduler.folders_at.parse()?,
            document_retention_days: trash.document_retention_days,
            folder_retention_days: trash.folder_retention_days,
        })
    }

    #[must_use]
    pub const fn jobs(&self) -> [(DailyAt, ScheduledJob); 2] {
        [
            (
                self.documents_at,
                ScheduledJob::SweepDocuments {
                    retention_days: self.document_retention_days,
                },
            ),
            (
                self.folders_at,
                ScheduledJob::SweepFolders {
                    retention_days: self.folder_retention_days,
                },
            ),
        ]
    }
}

/// Non-blocking lock that keeps a job from overlapping with itself.
#[derive(Debug, Clone, Default)]
pub struct RunLock(Arc<AtomicBool>);

/// Held while a job runs; releases the lock on drop.
#[derive(Debug)]
pub struct RunGuard(Arc<AtomicBool>);

impl RunLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock, or `None` if a run is already in progress.
    #[must_use]
    pub fn try_acquire(&self) -> Option<RunGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(self.0.clone()))
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Job executor trait for scheduled jobs.
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    /// Purge documents trashed more than `retention_days` ago.
    async fn sweep_documents(&self, retention_days: u32) -> AppResult<SweepReport>;

    /// Purge folders trashed more than `retention_days` ago.
    async fn sweep_folders(&self, retention_days: u32) -> AppResult<SweepReport>;
}

/// Result of one scheduled trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRun {
    /// The previous run had not finished.
    Skipped,
    Completed(SweepReport),
    Failed(String),
}

/// Run a job once unless it is already running.
pub async fn run_job<E: JobExecutor + ?Sized>(
    job: ScheduledJob,
    executor: &E,
    lock: &RunLock,
) -> JobRun {
    let Some(_guard) = lock.try_acquire() else {
        warn!(job = job.name(), "Previous run still in progress, skipping");
        return JobRun::Skipped;
    };

    info!(job = job.name(), "Starting scheduled job");
    let result = match job {
        ScheduledJob::SweepDocuments { retention_days } => {
            executor.sweep_documents(retention_days).await
        }
        ScheduledJob::SweepFolders { retention_days } => {
            executor.sweep_folders(retention_days).await
        }
    };

    match result {
        Ok(report) => {
            for (id, cause) in &report.failed {
                warn!(job = job.name(), id = %id, cause = %cause, "Item could not be purged");
            }
            info!(
                job = job.name(),
                attempted = report.attempted,
                succeeded = report.succeeded,
                failed = report.failed.len(),
                "Scheduled job finished"
            );
            JobRun::Completed(report)
        }
        Err(e) => {
            error!(job = job.name(), error = %e, "Scheduled job failed");
            JobRun::Failed(e.to_string())
        }
    }
}

/// Run the scheduler with the given schedule and executor.
///
/// Each job fires once a day at its configured time. A trigger that finds
/// the previous run of the same job still going is skipped, not queued.
pub fn run_scheduler<E: JobExecutor + 'static>(schedule: &Schedule, executor: Arc<E>) {
    for (at, job) in schedule.jobs() {
        let executor = executor.clone();
        let lock = RunLock::new();

        info!(job = job.name(), at = %at, "Scheduled daily job");

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(at.delay_from(Utc::now())).await;

                let executor = executor.clone();
                let lock = lock.clone();
                tokio::spawn(async move {
                    run_job(job, executor.as_ref(), &lock).await;
                });
            }
        });
    }
}
