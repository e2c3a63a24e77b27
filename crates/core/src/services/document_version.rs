//! Document version service.
//!
//! Versions form an append-only log per document. Numbers start at 1, grow
//! by one per create/update/restore, and are never reused: the next number
//! is always one past the highest ever allocated, even if auto-save pruning
//! has since removed that row.

use std::sync::Arc;

use chrono::Utc;
use marknest_common::{AppError, AppResult, IdGenerator, VersioningConfig};
use marknest_db::{
    TrashScope,
    entities::{
        document,
        document_version::{self, VersionOperation},
    },
    repositories::{DocumentRepository, DocumentVersionRepository},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Serialize;
use tracing::info;

use super::PageRequest;
use super::document::slug_for;

/// The fields two snapshots are compared on.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub size: i64,
    pub word_count: i32,
    pub char_count: i32,
}

impl<'a> From<&'a document_version::Model> for Snapshot<'a> {
    fn from(v: &'a document_version::Model) -> Self {
        Self {
            title: &v.title,
            content: &v.content,
            size: v.size,
            word_count: v.word_count,
            char_count: v.char_count,
        }
    }
}

impl<'a> From<&'a document::Model> for Snapshot<'a> {
    fn from(d: &'a document::Model) -> Self {
        Self {
            title: &d.title,
            content: &d.content,
            size: d.size,
            word_count: d.word_count,
            char_count: d.char_count,
        }
    }
}

/// Result of comparing two snapshots. Deltas are `new - old`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VersionComparison {
    pub title_changed: bool,
    pub content_changed: bool,
    pub word_count_delta: i64,
    pub char_count_delta: i64,
    pub size_delta: i64,
}

/// Compare two snapshots.
#[must_use]
pub fn compare_versions<'a, 'b>(
    old: impl Into<Snapshot<'a>>,
    new: impl Into<Snapshot<'b>>,
) -> VersionComparison {
    let (old, new) = (old.into(), new.into());
    VersionComparison {
        title_changed: old.title != new.title,
        content_changed: old.content != new.content,
        word_count_delta: i64::from(new.word_count) - i64::from(old.word_count),
        char_count_delta: i64::from(new.char_count) - i64::from(old.char_count),
        size_delta: new.size - old.size,
    }
}

/// A version compared with another version or with the live document.
#[derive(Debug, Clone, Serialize)]
pub struct VersionDiff {
    pub version: i32,
    /// Version compared against; `None` means the current document.
    pub against: Option<i32>,
    #[serde(flatten)]
    pub comparison: VersionComparison,
}

/// How a version came to be.
pub(crate) struct VersionMeta {
    pub operation: VersionOperation,
    pub change_summary: Option<String>,
    pub is_auto_save: bool,
}

/// Build a version row capturing the current state of `document`.
///
/// The version number is taken from the document, so the document must
/// already carry the newly allocated number.
pub(crate) fn snapshot_of(
    document: &document::Model,
    id: String,
    author_id: &str,
    meta: VersionMeta,
) -> document_version::ActiveModel {
    document_version::ActiveModel {
        id: Set(id),
        document_id: Set(document.id.clone()),
        user_id: Set(author_id.to_string()),
        version_number: Set(document.version_number),
        title: Set(document.title.clone()),
        content: Set(document.content.clone()),
        rendered_html: Set(document.rendered_html.clone()),
        size: Set(document.size),
        word_count: Set(document.word_count),
        char_count: Set(document.char_count),
        change_summary: Set(meta.change_summary),
        operation: Set(meta.operation),
        is_auto_save: Set(meta.is_auto_save),
        created_at: Set(Utc::now().into()),
    }
}

/// Allocate the next version number for a document.
pub(crate) async fn next_version_number<C: ConnectionTrait>(
    version_repo: &DocumentVersionRepository,
    conn: &C,
    document: &document::Model,
) -> AppResult<i32> {
    let max = version_repo.max_version_number(conn, &document.id).await?;
    Ok(max.max(document.version_number) + 1)
}

/// Delete auto-save versions of a document beyond the newest `keep`.
pub(crate) async fn prune_auto_saves<C: ConnectionTrait>(
    version_repo: &DocumentVersionRepository,
    conn: &C,
    document_id: &str,
    keep: u64,
) -> AppResult<u64> {
    let stale: Vec<String> = version_repo
        .find_auto_saves_beyond(conn, document_id, keep)
        .await?
        .into_iter()
        .map(|v| v.id)
        .collect();

    version_repo.delete_by_ids(conn, &stale).await
}

/// Document version service for history, restore and diff.
#[derive(Clone)]
pub struct DocumentVersionService {
    db: Arc<DatabaseConnection>,
    document_repo: DocumentRepository,
    version_repo: DocumentVersionRepository,
    id_gen: IdGenerator,
    config: VersioningConfig,
}

impl DocumentVersionService {
    /// Create a new document version service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        document_repo: DocumentRepository,
        version_repo: DocumentVersionRepository,
        config: VersioningConfig,
    ) -> Self {
        Self {
            db,
            document_repo,
            version_repo,
            id_gen: IdGenerator::new(),
            config,
        }
    }

    /// List versions of a document, newest first, with the total count.
    pub async fn list_versions(
        &self,
        user_id: &str,
        document_id: &str,
        page: PageRequest,
    ) -> AppResult<(Vec<document_version::Model>, u64)> {
        let document = self
            .document_repo
            .find_owned(user_id, document_id, TrashScope::ExcludeTrashed)
            .await?;

        let versions = self
            .version_repo
            .find_by_document(&document.id, page.limit(), page.offset())
            .await?;
        let total = self.version_repo.count_by_document(&document.id).await?;

        Ok((versions, total))
    }

    /// Get a single version of a document.
    pub async fn get_version(
        &self,
        user_id: &str,
        document_id: &str,
        version_number: i32,
    ) -> AppResult<document_version::Model> {
        let document = self
            .document_repo
            .find_owned(user_id, document_id, TrashScope::ExcludeTrashed)
            .await?;

        self.version_repo
            .get_by_number(&document.id, version_number)
            .await
    }

    /// Restore a document to an earlier version.
    ///
    /// The old content becomes a brand-new version (`max + 1`) tagged
    /// `restore`; no history is discarded.
    pub async fn restore_version(
        &self,
        user_id: &str,
        document_id: &str,
        version_number: i32,
        change_summary: Option<String>,
    ) -> AppResult<document::Model> {
        let document = self
            .document_repo
            .find_owned(user_id, document_id, TrashScope::ExcludeTrashed)
            .await?;
        let target = self
            .version_repo
            .get_by_number(&document.id, version_number)
            .await?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        let next = next_version_number(&self.version_repo, &txn, &document)
            .await
            .map_err(AppError::in_transaction)?;

        let mut active: document::ActiveModel = document.clone().into();
        if target.title != document.title {
            active.slug = Set(slug_for(&target.title, &document.id));
        }
        active.title = Set(target.title.clone());
        active.content = Set(target.content.clone());
        active.rendered_html = Set(target.rendered_html.clone());
        active.size = Set(target.size);
        active.word_count = Set(target.word_count);
        active.char_count = Set(target.char_count);
        active.version_number = Set(next);
        active.updated_at = Set(Utc::now().into());

        let updated = self
            .document_repo
            .update(&txn, active)
            .await
            .map_err(AppError::in_transaction)?;

        let summary = change_summary
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| format!("Restored from version {version_number}"));
        let version = snapshot_of(
            &updated,
            self.id_gen.generate(),
            user_id,
            VersionMeta {
                operation: VersionOperation::Restore,
                change_summary: Some(summary),
                is_auto_save: false,
            },
        );
        self.version_repo
            .create(&txn, version)
            .await
            .map_err(AppError::in_transaction)?;

        txn.commit()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        info!(
            document_id = %updated.id,
            restored = version_number,
            version = next,
            "Restored document version"
        );

        Ok(updated)
    }

    /// Compare a version with another version, or with the current document.
    pub async fn diff_version(
        &self,
        user_id: &str,
        document_id: &str,
        version_number: i32,
        against: Option<i32>,
    ) -> AppResult<VersionDiff> {
        let document = self
            .document_repo
            .find_owned(user_id, document_id, TrashScope::ExcludeTrashed)
            .await?;
        let version = self
            .version_repo
            .get_by_number(&document.id, version_number)
            .await?;

        let comparison = match against {
            Some(other) => {
                let other = self.version_repo.get_by_number(&document.id, other).await?;
                compare_versions(&version, &other)
            }
            None => compare_versions(&version, &document),
        };

        Ok(VersionDiff {
            version: version_number,
            against,
            comparison,
        })
    }

    /// Delete auto-save versions beyond the newest `keep` (configured default
    /// when `None`). Manual versions are never touched. Returns the number
    /// of versions deleted.
    pub async fn cleanup_auto_saves(
        &self,
        user_id: &str,
        document_id: &str,
        keep: Option<u64>,
    ) -> AppResult<u64> {
        let document = self
            .document_repo
            .find_owned(user_id, document_id, TrashScope::ExcludeTrashed)
            .await?;
        let keep = keep.unwrap_or(self.config.auto_save_keep);

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        let deleted = prune_auto_saves(&self.version_repo, &txn, &document.id, keep)
            .await
            .map_err(AppError::in_transaction)?;

        txn.commit()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        info!(document_id = %document.id, keep, deleted, "Pruned auto-save versions");

        Ok(deleted)
    }
}
