//! Media attachment repository.

use std::sync::Arc;

use crate::entities::{MediaAttachment, media_attachment};
use marknest_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

/// Media attachment repository for database operations.
#[derive(Clone)]
pub struct MediaAttachmentRepository {
    db: Arc<DatabaseConnection>,
}

impl MediaAttachmentRepository {
    /// Create a new media attachment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Record an attachment.
    pub async fn create(
        &self,
        model: media_attachment::ActiveModel,
    ) -> AppResult<media_attachment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the attachments of a document.
    pub async fn find_by_document<C: ConnectionTrait>(
        &self,
        conn: &C,
        document_id: &str,
    ) -> AppResult<Vec<media_attachment::Model>> {
        MediaAttachment::find()
            .filter(media_attachment::Column::DocumentId.eq(document_id))
            .all(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Detach every attachment of a document. Blobs are left to the caller.
    pub async fn delete_by_document<C: ConnectionTrait>(
        &self,
        conn: &C,
        document_id: &str,
    ) -> AppResult<u64> {
        let result = MediaAttachment::delete_many()
            .filter(media_attachment::Column::DocumentId.eq(document_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_find_then_detach() {
        let attachment = media_attachment::Model {
            id: "m1".to_string(),
            document_id: "doc1".to_string(),
            user_id: "user1".to_string(),
            file_name: "diagram.png".to_string(),
            storage_key: "documents/doc1/abc.png".to_string(),
            content_type: "image/png".to_string(),
            size: 2048,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[attachment]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = MediaAttachmentRepository::new(db.clone());
        let found = repo.find_by_document(db.as_ref(), "doc1").await.unwrap();
        assert_eq!(found[0].storage_key, "documents/doc1/abc.png");

        let detached = repo.delete_by_document(db.as_ref(), "doc1").await.unwrap();
        assert_eq!(detached, 1);
    }
}
