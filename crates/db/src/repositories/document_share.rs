//! Document share repository.

use std::sync::Arc;

use crate::entities::{DocumentShare, document_share};
use marknest_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

/// Document share repository for database operations.
#[derive(Clone)]
pub struct DocumentShareRepository {
    db: Arc<DatabaseConnection>,
}

impl DocumentShareRepository {
    /// Create a new document share repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a share.
    pub async fn create(
        &self,
        model: document_share::ActiveModel,
    ) -> AppResult<document_share::Model> {
        model.insert(self.db.as_ref()).await.map_err(AppError::from)
    }

    /// Find the shares of a document.
    pub async fn find_by_document(
        &self,
        document_id: &str,
    ) -> AppResult<Vec<document_share::Model>> {
        DocumentShare::find()
            .filter(document_share::Column::DocumentId.eq(document_id))
            .order_by_desc(document_share::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete every share of a document.
    pub async fn delete_by_document<C: ConnectionTrait>(
        &self,
        conn: &C,
        document_id: &str,
    ) -> AppResult<u64> {
        let result = DocumentShare::delete_many()
            .filter(document_share::Column::DocumentId.eq(document_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}
