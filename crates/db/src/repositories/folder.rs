//! Folder repository.

use std::sync::Arc;

use crate::entities::{Folder, folder};
use crate::trash::TrashScope;
use marknest_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, prelude::DateTimeWithTimeZone,
};

/// Folder repository for database operations.
#[derive(Clone)]
pub struct FolderRepository {
    db: Arc<DatabaseConnection>,
}

impl FolderRepository {
    /// Create a new folder repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a folder by ID.
    pub async fn find_by_id(
        &self,
        id: &str,
        scope: TrashScope,
    ) -> AppResult<Option<folder::Model>> {
        scope
            .apply(Folder::find_by_id(id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a folder owned by `user_id`, returning error if not found.
    pub async fn find_owned(
        &self,
        user_id: &str,
        id: &str,
        scope: TrashScope,
    ) -> AppResult<folder::Model> {
        self.find_by_id(id, scope)
            .await?
            .filter(|f| f.user_id == user_id)
            .ok_or_else(|| AppError::FolderNotFound(id.to_string()))
    }

    /// Find folders by ID.
    pub async fn find_by_ids(
        &self,
        ids: &[String],
        scope: TrashScope,
    ) -> AppResult<Vec<folder::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        scope
            .apply(Folder::find())
            .filter(folder::Column::Id.is_in(ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user's folders under a parent (top level when `parent_id` is `None`).
    pub async fn find_by_user(
        &self,
        user_id: &str,
        parent_id: Option<&str>,
        scope: TrashScope,
    ) -> AppResult<Vec<folder::Model>> {
        let mut query = scope
            .apply(Folder::find())
            .filter(folder::Column::UserId.eq(user_id))
            .order_by_asc(folder::Column::Name);

        if let Some(parent) = parent_id {
            query = query.filter(folder::Column::ParentId.eq(parent));
        } else {
            query = query.filter(folder::Column::ParentId.is_null());
        }

        query
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find the direct children of a folder.
    pub async fn find_children(
        &self,
        parent_id: &str,
        scope: TrashScope,
    ) -> AppResult<Vec<folder::Model>> {
        scope
            .apply(Folder::find())
            .filter(folder::Column::ParentId.eq(parent_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find trashed folders whose `deleted_at` is older than `cutoff`.
    pub async fn find_trashed_before(
        &self,
        cutoff: DateTimeWithTimeZone,
    ) -> AppResult<Vec<folder::Model>> {
        TrashScope::OnlyTrashed
            .apply(Folder::find())
            .filter(folder::Column::DeletedAt.lt(cutoff))
            .order_by_asc(folder::Column::DeletedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a folder.
    pub async fn create<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: folder::ActiveModel,
    ) -> AppResult<folder::Model> {
        model
            .insert(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a folder.
    pub async fn update<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: folder::ActiveModel,
    ) -> AppResult<folder::Model> {
        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Permanently delete a folder row.
    pub async fn delete<C: ConnectionTrait>(&self, conn: &C, id: &str) -> AppResult<()> {
        Folder::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Stamp `deleted_at` on live folders.
    pub async fn trash_many<C: ConnectionTrait>(
        &self,
        conn: &C,
        ids: &[String],
        at: DateTimeWithTimeZone,
    ) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Folder::update_many()
            .col_expr(folder::Column::DeletedAt, Expr::value(at))
            .filter(folder::Column::Id.is_in(ids.iter().map(String::as_str)))
            .filter(folder::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Clear `deleted_at` on folders that were trashed at exactly `at`.
    pub async fn restore_many<C: ConnectionTrait>(
        &self,
        conn: &C,
        ids: &[String],
        at: DateTimeWithTimeZone,
    ) -> AppResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = Folder::update_many()
            .col_expr(
                folder::Column::DeletedAt,
                Expr::value(Option::<DateTimeWithTimeZone>::None),
            )
            .filter(folder::Column::Id.is_in(ids.iter().map(String::as_str)))
            .filter(folder::Column::DeletedAt.eq(at))
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
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    pub(crate) fn create_test_folder(
        id: &str,
        user_id: &str,
        parent_id: Option<&str>,
    ) -> folder::Model {
        let now = Utc::now().into();
        folder::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            name: format!("Folder {id}"),
            parent_id: parent_id.map(ToString::to_string),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_owned() {
        let folder = create_test_folder("f1", "user1", None);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[folder.clone()], [folder]])
                .into_connection(),
        );

        let repo = FolderRepository::new(db);
        let found = repo
            .find_owned("user1", "f1", TrashScope::ExcludeTrashed)
            .await
            .unwrap();
        assert_eq!(found.id, "f1");

        let other = repo
            .find_owned("user2", "f1", TrashScope::ExcludeTrashed)
            .await;
        assert!(matches!(other, Err(AppError::FolderNotFound(_))));
    }

    #[tokio::test]
    async fn test_find_children() {
        let a = create_test_folder("a", "user1", Some("root"));
        let b = create_test_folder("b", "user1", Some("root"));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[a, b]])
                .into_connection(),
        );

        let repo = FolderRepository::new(db);
        let children = repo
            .find_children("root", TrashScope::WithTrashed)
            .await
            .unwrap();

        assert_eq!(children.len(), 2);
    }

    #[tokio::test]
    async fn test_find_trashed_before() {
        let mut folder = create_test_folder("f1", "user1", None);
        folder.deleted_at = Some((Utc::now() - Duration::days(91)).into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[folder]])
                .into_connection(),
        );

        let repo = FolderRepository::new(db);
        let result = repo
            .find_trashed_before((Utc::now() - Duration::days(90)).into())
            .await
            .unwrap();

        assert_eq!(result.len(), 1);
        assert!(result[0].is_trashed());
    }

    #[tokio::test]
    async fn test_trash_many() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                }])
                .into_connection(),
        );

        let repo = FolderRepository::new(db.clone());
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let affected = repo
            .trash_many(db.as_ref(), &ids, Utc::now().into())
            .await
            .unwrap();

        assert_eq!(affected, 3);
    }
}
