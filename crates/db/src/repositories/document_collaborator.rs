//! Document collaborator repository.

use std::sync::Arc;

use crate::entities::{DocumentCollaborator, document_collaborator};
use marknest_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

/// Document collaborator repository for database operations.
#[derive(Clone)]
pub struct DocumentCollaboratorRepository {
    db: Arc<DatabaseConnection>,
}

impl DocumentCollaboratorRepository {
    /// Create a new document collaborator repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Add a collaborator.
    pub async fn create(
        &self,
        model: document_collaborator::ActiveModel,
    ) -> AppResult<document_collaborator::Model> {
        model.insert(self.db.as_ref()).await.map_err(AppError::from)
    }

    /// Find the collaborators of a document.
    pub async fn find_by_document(
        &self,
        document_id: &str,
    ) -> AppResult<Vec<document_collaborator::Model>> {
        DocumentCollaborator::find()
            .filter(document_collaborator::Column::DocumentId.eq(document_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove every collaborator of a document.
    pub async fn delete_by_document<C: ConnectionTrait>(
        &self,
        conn: &C,
        document_id: &str,
    ) -> AppResult<u64> {
        let result = DocumentCollaborator::delete_many()
            .filter(document_collaborator::Column::DocumentId.eq(document_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
