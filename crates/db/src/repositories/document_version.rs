//! Document version repository.

use std::sync::Arc;

use crate::entities::{DocumentVersion, document_version};
use marknest_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

#[derive(Debug, FromQueryResult)]
struct MaxVersion {
    max_version: Option<i32>,
}

/// Document version repository for database operations.
#[derive(Clone)]
pub struct DocumentVersionRepository {
    db: Arc<DatabaseConnection>,
}

impl DocumentVersionRepository {
    /// Create a new document version repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a version of a document by its number.
    pub async fn find_by_number(
        &self,
        document_id: &str,
        version_number: i32,
    ) -> AppResult<Option<document_version::Model>> {
        DocumentVersion::find()
            .filter(document_version::Column::DocumentId.eq(document_id))
            .filter(document_version::Column::VersionNumber.eq(version_number))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a version of a document by its number, returning error if not found.
    pub async fn get_by_number(
        &self,
        document_id: &str,
        version_number: i32,
    ) -> AppResult<document_version::Model> {
        self.find_by_number(document_id, version_number)
            .await?
            .ok_or_else(|| {
                AppError::VersionNotFound(format!("{document_id} v{version_number}"))
            })
    }

    /// List versions of a document (paginated, newest first).
    pub async fn find_by_document(
        &self,
        document_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<document_version::Model>> {
        DocumentVersion::find()
            .filter(document_version::Column::DocumentId.eq(document_id))
            .order_by_desc(document_version::Column::VersionNumber)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count versions of a document.
    pub async fn count_by_document(&self, document_id: &str) -> AppResult<u64> {
        DocumentVersion::find()
            .filter(document_version::Column::DocumentId.eq(document_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Highest version number recorded for a document, or 0 if it has none.
    pub async fn max_version_number<C: ConnectionTrait>(
        &self,
        conn: &C,
        document_id: &str,
    ) -> AppResult<i32> {
        let row = DocumentVersion::find()
            .select_only()
            .column_as(document_version::Column::VersionNumber.max(), "max_version")
            .filter(document_version::Column::DocumentId.eq(document_id))
            .into_model::<MaxVersion>()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.and_then(|r| r.max_version).unwrap_or(0))
    }

    /// Insert a version.
    ///
    /// A duplicate `(document_id, version_number)` fails with
    /// [`AppError::Conflict`].
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: document_version::ActiveModel,
    ) -> AppResult<document_version::Model> {
        model.insert(conn).await.map_err(AppError::from)
    }

    /// Auto-save versions of a document beyond the newest `keep`.
    pub async fn find_auto_saves_beyond<C: ConnectionTrait>(
        &self,
        conn: &C,
        document_id: &str,
        keep: u64,
    ) -> AppResult<Vec<document_version::Model>> {
        DocumentVersion::find()
            .filter(document_version::Column::DocumentId.eq(document_id))
            .filter(document_version::Column::IsAutoSave.eq(true))
            .order_by_desc(document_version::Column::VersionNumber)
            .offset(keep)
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete versions by ID.
    pub async fn delete_by_ids<C: ConnectionTrait>(
        &self,
        conn: &C,
        ids: &[String],
    ) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = DocumentVersion::delete_many()
            .filter(document_version::Column::Id.is_in(ids.iter().map(String::as_str)))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete every version of a document.
    pub async fn delete_by_document<C: ConnectionTrait>(
        &self,
        conn: &C,
        document_id: &str,
    ) -> AppResult<u64> {
        let result = DocumentVersion::delete_many()
            .filter(document_version::Column::DocumentId.eq(document_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
