//! Document repository.

use std::sync::Arc;

use crate::entities::{
    Document,
    document::{self, DocumentStatus},
};
use crate::trash::TrashScope;
use marknest_common::{AppError, AppResult};
use sea_orm::sea_query::{Expr, extension::postgres::PgBinOper};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, prelude::DateTimeWithTimeZone,
};

/// Filters for listing a user's documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    /// Only documents directly inside this folder.
    pub folder_id: Option<String>,
    pub status: Option<DocumentStatus>,
    pub is_favorite: Option<bool>,
    pub is_archived: Option<bool>,
    /// Only documents carrying this tag.
    pub tag: Option<String>,
}

impl DocumentFilter {
    fn apply(&self, mut query: Select<Document>) -> Select<Document> {
        if let Some(folder_id) = &self.folder_id {
            query = query.filter(document::Column::FolderId.eq(folder_id.as_str()));
        }
        if let Some(status) = self.status {
            query = query.filter(document::Column::Status.eq(status));
        }
        if let Some(is_favorite) = self.is_favorite {
            query = query.filter(document::Column::IsFavorite.eq(is_favorite));
        }
        if let Some(is_archived) = self.is_archived {
            query = query.filter(document::Column::IsArchived.eq(is_archived));
        }
        if let Some(tag) = &self.tag {
            query = query.filter(
                Expr::col((Document, document::Column::Tags))
                    .binary(PgBinOper::Contains, Expr::val(serde_json::json!([tag]))),
            );
        }
        query
    }
}

/// Document repository for database operations.
#[derive(Clone)]
pub struct DocumentRepository {
    db: Arc<DatabaseConnection>,
}

impl DocumentRepository {
    /// Create a new document repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a document by ID.
    pub async fn find_by_id(
        &self,
        id: &str,
        scope: TrashScope,
    ) -> AppResult<Option<document::Model>> {
        scope
            .apply(Document::find_by_id(id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a document owned by `user_id`, returning error if not found.
    ///
    /// A document owned by someone else is reported as missing.
    pub async fn find_owned(
        &self,
        user_id: &str,
        id: &str,
        scope: TrashScope,
    ) -> AppResult<document::Model> {
        self.find_by_id(id, scope)
            .await?
            .filter(|d| d.user_id == user_id)
            .ok_or_else(|| AppError::DocumentNotFound(id.to_string()))
    }

    /// List a user's documents, most recently updated first.
    pub async fn find_by_user(
        &self,
        user_id: &str,
        filter: &DocumentFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<document::Model>> {
        let query = Document::find().filter(document::Column::UserId.eq(user_id));

        filter
            .apply(TrashScope::ExcludeTrashed.apply(query))
            .order_by_desc(document::Column::UpdatedAt)
            .order_by_desc(document::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count a user's documents matching a filter.
    pub async fn count_by_user(&self, user_id: &str, filter: &DocumentFilter) -> AppResult<u64> {
        let query = Document::find().filter(document::Column::UserId.eq(user_id));

        filter
            .apply(TrashScope::ExcludeTrashed.apply(query))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find trashed documents whose `deleted_at` is older than `cutoff`.
    pub async fn find_trashed_before(
        &self,
        cutoff: DateTimeWithTimeZone,
    ) -> AppResult<Vec<document::Model>> {
        TrashScope::OnlyTrashed
            .apply(Document::find())
            .filter(document::Column::DeletedAt.lt(cutoff))
            .order_by_asc(document::Column::DeletedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find documents directly inside any of the given folders.
    pub async fn find_in_folders(
        &self,
        folder_ids: &[String],
        scope: TrashScope,
    ) -> AppResult<Vec<document::Model>> {
        if folder_ids.is_empty() {
            return Ok(vec![]);
        }

        scope
            .apply(Document::find())
            .filter(document::Column::FolderId.is_in(folder_ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a document.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: document::ActiveModel,
    ) -> AppResult<document::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a document.
    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: document::ActiveModel,
    ) -> AppResult<document::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Permanently delete a document row.
    pub async fn delete<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<()> {
        Document::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Move the live documents of the given folders to the trash.
    pub async fn trash_in_folders<C: ConnectionTrait>(
        &self,
        conn: &C,
        folder_ids: &[String],
        at: DateTimeWithTimeZone,
    ) -> AppResult<u64> {
        if folder_ids.is_empty() {
            return Ok(0);
        }

        let result = Document::update_many()
            .col_expr(document::Column::IsTrashed, Expr::value(true))
            .col_expr(document::Column::DeletedAt, Expr::value(at))
            .filter(document::Column::FolderId.is_in(folder_ids.iter().map(String::as_str)))
            .filter(document::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Restore documents of the given folders that were trashed at exactly `at`.
    pub async fn restore_in_folders<C: ConnectionTrait>(
        &self,
        conn: &C,
        folder_ids: &[String],
        at: DateTimeWithTimeZone,
    ) -> AppResult<u64> {
        if folder_ids.is_empty() {
            return Ok(0);
        }

        let result = Document::update_many()
            .col_expr(document::Column::IsTrashed, Expr::value(false))
            .col_expr(
                document::Column::DeletedAt,
                Expr::value(Option::<DateTimeWithTimeZone>::None),
            )
            .filter(document::Column::FolderId.is_in(folder_ids.iter().map(String::as_str)))
            .filter(document::Column::DeletedAt.eq(at))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, DbBackend, MockDatabase, MockExecResult, QueryTrait};

    pub(crate) fn create_test_document(id: &str, user_id: &str) -> document::Model {
        let now = Utc::now().into();
        document::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            folder_id: None,
            title: "Notes".to_string(),
            slug: id.to_string(),
            content: "hello world".to_string(),
            rendered_html: "<p>hello world</p>".to_string(),
            size: 11,
            word_count: 2,
            char_count: 11,
            version_number: 1,
            tags: serde_json::json!(["work"]),
            status: DocumentStatus::Draft,
            is_favorite: false,
            is_archived: false,
            is_trashed: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let doc = create_test_document("doc1", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[doc.clone()]])
                .into_connection(),
        );

        let repo = DocumentRepository::new(db);
        let result = repo
            .find_by_id("doc1", TrashScope::ExcludeTrashed)
            .await
            .unwrap();

        assert_eq!(result.unwrap().id, "doc1");
    }

    #[tokio::test]
    async fn test_find_owned_rejects_other_owner() {
        let doc = create_test_document("doc1", "user1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[doc]])
                .into_connection(),
        );

        let repo = DocumentRepository::new(db);
        let result = repo
            .find_owned("user2", "doc1", TrashScope::ExcludeTrashed)
            .await;

        assert!(matches!(result, Err(AppError::DocumentNotFound(_))));
    }

    #[tokio::test]
    async fn test_count_by_user() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .into_connection(),
        );

        let repo = DocumentRepository::new(db);
        let count = repo
            .count_by_user("user1", &DocumentFilter::default())
            .await
            .unwrap();

        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_find_trashed_before() {
        let mut doc = create_test_document("doc1", "user1");
        doc.is_trashed = true;
        doc.deleted_at = Some((Utc::now() - Duration::days(31)).into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[doc]])
                .into_connection(),
        );

        let repo = DocumentRepository::new(db);
        let result = repo
            .find_trashed_before((Utc::now() - Duration::days(30)).into())
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_folder_list_skips_query() {
        // No results queued: any query would fail.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = DocumentRepository::new(db.clone());
        assert!(
            repo.find_in_folders(&[], TrashScope::WithTrashed)
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(
            repo.trash_in_folders(db.as_ref(), &[], Utc::now().into())
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_trash_in_folders() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = DocumentRepository::new(db.clone());
        let affected = repo
            .trash_in_folders(db.as_ref(), &["f1".to_string()], Utc::now().into())
            .await
            .unwrap();

        assert_eq!(affected, 2);
    }

    #[test]
    fn test_filter_sql() {
        let filter = DocumentFilter {
            status: Some(DocumentStatus::Published),
            tag: Some("work".to_string()),
            ..Default::default()
        };
        let sql = filter
            .apply(Document::find())
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""document"."status" = 'published'"#));
        assert!(sql.contains(r#""document"."tags" @>"#));
    }
}
