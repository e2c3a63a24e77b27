//! Job executor backed by the trash sweeper.

use marknest_common::AppResult;
use marknest_core::{SweepReport, TrashService};

use crate::scheduler::JobExecutor;

/// Runs scheduled sweeps against the database.
#[derive(Clone)]
pub struct TrashSweepExecutor {
    trash: TrashService,
}

impl TrashSweepExecutor {
    /// Create an executor around a trash service.
    #[must_use]
    pub const fn new(trash: TrashService) -> Self {
        Self { trash }
    }
}

#[async_trait::async_trait]
impl JobExecutor for TrashSweepExecutor {
    async fn sweep_documents(&self, retention_days: u32) -> AppResult<SweepReport> {
        self.trash.sweep_documents(retention_days).await
    }

    async fn sweep_folders(&self, retention_days: u32) -> AppResult<SweepReport> {
        self.trash.sweep_folders(retention_days).await
    }
}
