//! Trash retention sweeper.
//!
//! Soft-deleted documents and folders stay recoverable for a retention
//! window. Once it has passed they are purged for good, together with
//! everything hanging off them. Per-item failures are recorded in the
//! [`SweepReport`] and never abort the rest of the batch.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use marknest_common::AppResult;
use marknest_db::{
    TrashScope,
    entities::{document, folder},
    repositories::{DocumentRepository, FolderRepository},
};
use serde::Serialize;
use tracing::{error, info};

use super::purge::Purger;

/// Outcome of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub attempted: usize,
    pub succeeded: usize,
    /// `(id, error)` for every item that could not be purged.
    pub failed: Vec<(String, String)>,
}

impl SweepReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Items trashed before this instant are past retention.
#[must_use]
pub fn retention_cutoff(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    now - Duration::days(i64::from(days))
}

/// Keep the folders a sweep purges directly.
///
/// A trashed folder whose parent is also trashed goes away with the
/// parent's cascade and is left out here. `parents` maps folder id to
/// the parent row as currently stored, if it still exists.
#[must_use]
pub fn sweepable_folders(
    candidates: Vec<folder::Model>,
    parents: &HashMap<String, folder::Model>,
) -> Vec<folder::Model> {
    candidates
        .into_iter()
        .filter(|f| match &f.parent_id {
            None => true,
            Some(parent_id) => parents.get(parent_id).is_none_or(|p| !p.is_trashed()),
        })
        .collect()
}

/// Purges trash past its retention window.
#[derive(Clone)]
pub struct TrashService {
    document_repo: DocumentRepository,
    folder_repo: FolderRepository,
    purger: Purger,
}

impl TrashService {
    #[must_use]
    pub const fn new(
        document_repo: DocumentRepository,
        folder_repo: FolderRepository,
        purger: Purger,
    ) -> Self {
        Self {
            document_repo,
            folder_repo,
            purger,
        }
    }

    /// Trashed documents older than `days`.
    pub async fn pending_documents(&self, days: u32) -> AppResult<Vec<document::Model>> {
        let cutoff = retention_cutoff(Utc::now(), days);
        self.document_repo.find_trashed_before(cutoff.into()).await
    }

    /// Purge each document, collecting failures.
    pub async fn purge_documents(&self, candidates: &[document::Model]) -> SweepReport {
        let mut report = SweepReport {
            attempted: candidates.len(),
            ..Default::default()
        };

        for document in candidates {
            match self.purger.purge_document(&document.id).await {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    error!(document_id = %document.id, error = %e, "Failed to purge document");
                    report.failed.push((document.id.clone(), e.to_string()));
                }
            }
        }

        report
    }

    /// Purge every document trashed more than `days` ago.
    pub async fn sweep_documents(&self, days: u32) -> AppResult<SweepReport> {
        let candidates = self.pending_documents(days).await?;
        let report = self.purge_documents(&candidates).await;
        info!(
            days,
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "Document trash sweep finished"
        );
        Ok(report)
    }

    /// Trashed folders older than `days` that are not covered by a trashed parent.
    pub async fn pending_folders(&self, days: u32) -> AppResult<Vec<folder::Model>> {
        let cutoff = retention_cutoff(Utc::now(), days);
        let candidates = self.folder_repo.find_trashed_before(cutoff.into()).await?;

        let mut parent_ids: Vec<String> = candidates
            .iter()
            .filter_map(|f| f.parent_id.clone())
            .collect();
        parent_ids.sort_unstable();
        parent_ids.dedup();

        let parents = self
            .folder_repo
            .find_by_ids(&parent_ids, TrashScope::WithTrashed)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();

        Ok(sweepable_folders(candidates, &parents))
    }

    /// Purge each folder tree, collecting failures.
    pub async fn purge_folders(&self, candidates: &[folder::Model]) -> SweepReport {
        let mut report = SweepReport {
            attempted: candidates.len(),
            ..Default::default()
        };

        for folder in candidates {
            match self.purger.purge_folder_tree(&folder.id).await {
                Ok(_) => report.succeeded += 1,
                Err(e) => {
                    error!(folder_id = %folder.id, error = %e, "Failed to purge folder");
                    report.failed.push((folder.id.clone(), e.to_string()));
                }
            }
        }

        report
    }

    /// Purge every eligible folder trashed more than `days` ago.
    pub async fn sweep_folders(&self, days: u32) -> AppResult<SweepReport> {
        let candidates = self.pending_folders(days).await?;
        let report = self.purge_folders(&candidates).await;
        info!(
            days,
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed.len(),
            "Folder trash sweep finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::services::purge::tests::RecordingStorage;
    use marknest_db::entities::document::DocumentStatus;
    use marknest_db::entities::media_attachment;
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult};
    use serde_json::json;

    fn folder(id: &str, parent_id: Option<&str>, trashed: bool) -> folder::Model {
        let now = Utc::now();
        folder::Model {
            id: id.to_string(),
            user_id: "user1".to_string(),
            name: id.to_string(),
            parent_id: parent_id.map(ToString::to_string),
            created_at: now.into(),
            updated_at: now.into(),
            deleted_at: trashed.then(|| (now - Duration::days(100)).into()),
        }
    }

    fn trashed_document(id: &str) -> document::Model {
        let now = Utc::now();
        document::Model {
            id: id.to_string(),
            user_id: "user1".to_string(),
            folder_id: None,
            title: id.to_string(),
            slug: id.to_string(),
            content: String::new(),
            rendered_html: String::new(),
            size: 0,
            word_count: 0,
            char_count: 0,
            version_number: 1,
            tags: json!([]),
            status: DocumentStatus::Draft,
            is_favorite: false,
            is_archived: false,
            is_trashed: true,
            created_at: now.into(),
            updated_at: now.into(),
            deleted_at: Some((now - Duration::days(31)).into()),
        }
    }

    fn service(db: Arc<DatabaseConnection>) -> TrashService {
        TrashService::new(
            DocumentRepository::new(db.clone()),
            FolderRepository::new(db.clone()),
            Purger::new(db, Arc::new(RecordingStorage::default())),
        )
    }

    fn exec(rows: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: rows,
        }
    }

    #[test]
    fn test_retention_cutoff() {
        let now = Utc::now();
        assert_eq!(now - retention_cutoff(now, 30), Duration::days(30));
        assert_eq!(retention_cutoff(now, 0), now);
    }

    #[test]
    fn test_sweepable_folders() {
        let parents: HashMap<_, _> = [
            ("live".to_string(), folder("live", None, false)),
            ("dead".to_string(), folder("dead", None, true)),
        ]
        .into_iter()
        .collect();

        let candidates = vec![
            folder("root", None, true),
            folder("under_live", Some("live"), true),
            folder("under_dead", Some("dead"), true),
            folder("orphan", Some("gone"), true),
        ];

        let kept: Vec<String> = sweepable_folders(candidates, &parents)
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(kept, vec!["root", "under_live", "orphan"]);
    }

    #[tokio::test]
    async fn test_sweep_documents_records_failures_and_continues() {
        let exec_ok = [exec(1), exec(0), exec(0), exec(0), exec(1)];
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![trashed_document("d1"), trashed_document("d2")]])
                .append_query_results([
                    Vec::<media_attachment::Model>::new(),
                    Vec::<media_attachment::Model>::new(),
                ])
                .append_exec_errors([DbErr::Custom("locked".to_string())])
                .append_exec_results(exec_ok)
                .into_connection(),
        );

        let report = service(db).sweep_documents(30).await.unwrap();
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "d1");
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn test_sweep_with_nothing_pending() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<document::Model>::new()])
                .into_connection(),
        );

        let report = service(db).sweep_documents(30).await.unwrap();
        assert_eq!(report, SweepReport::default());
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_errors([DbErr::Custom("connection refused".to_string())])
                .into_connection(),
        );

        assert!(service(db).sweep_folders(90).await.is_err());
    }

    #[tokio::test]
    async fn test_pending_folders_skips_children_of_trashed_parents() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    folder("dead", None, true),
                    folder("under_live", Some("live"), true),
                    folder("under_dead", Some("dead"), true),
                ]])
                .append_query_results([vec![
                    folder("dead", None, true),
                    folder("live", None, false),
                ]])
                .into_connection(),
        );

        let pending: Vec<String> = service(db)
            .pending_folders(90)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.id)
            .collect();
        assert_eq!(pending, vec!["dead", "under_live"]);
    }
}
