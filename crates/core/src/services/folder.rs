//! Folder service.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use marknest_common::{AppError, AppResult, IdGenerator};
use marknest_db::{
    TrashScope,
    entities::folder,
    repositories::{DocumentRepository, FolderRepository},
};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::purge::{FolderPurge, Purger};

/// Input for creating a folder.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFolderInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    pub parent_id: Option<String>,
}

/// Rows touched by trashing or restoring a folder tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TrashedTree {
    pub folders: u64,
    pub documents: u64,
}

/// Collect `root` and every folder below it, parents before children.
///
/// Children are only followed when `keep` accepts them. The visited set
/// guards against a corrupted `parent_id` chain looping back on itself.
pub(crate) async fn collect_subtree<F>(
    repo: &FolderRepository,
    root: folder::Model,
    scope: TrashScope,
    keep: F,
) -> AppResult<Vec<folder::Model>>
where
    F: Fn(&folder::Model) -> bool,
{
    let mut visited = HashSet::from([root.id.clone()]);
    let mut stack = vec![root];
    let mut tree = Vec::new();

    while let Some(folder) = stack.pop() {
        for child in repo.find_children(&folder.id, scope).await? {
            if keep(&child) && visited.insert(child.id.clone()) {
                stack.push(child);
            }
        }
        tree.push(folder);
    }

    Ok(tree)
}

/// Folder service.
#[derive(Clone)]
pub struct FolderService {
    db: Arc<DatabaseConnection>,
    folder_repo: FolderRepository,
    document_repo: DocumentRepository,
    purger: Purger,
    id_gen: IdGenerator,
}

impl FolderService {
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        folder_repo: FolderRepository,
        document_repo: DocumentRepository,
        purger: Purger,
    ) -> Self {
        Self {
            db,
            folder_repo,
            document_repo,
            purger,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a folder, optionally under a live parent owned by the user.
    pub async fn create(&self, user_id: &str, input: CreateFolderInput) -> AppResult<folder::Model> {
        input.validate()?;
        if input.name.trim().is_empty() {
            return Err(AppError::Validation("name: must not be blank".to_string()));
        }
        if let Some(parent_id) = &input.parent_id {
            self.folder_repo
                .find_owned(user_id, parent_id, TrashScope::ExcludeTrashed)
                .await?;
        }

        let now = Utc::now().into();
        let model = folder::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            name: Set(input.name),
            parent_id: Set(input.parent_id),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let folder = self.folder_repo.create(self.db.as_ref(), model).await?;
        info!(folder_id = %folder.id, user_id = %user_id, "Created folder");
        Ok(folder)
    }

    /// Get a live folder.
    pub async fn get(&self, user_id: &str, id: &str) -> AppResult<folder::Model> {
        self.folder_repo
            .find_owned(user_id, id, TrashScope::ExcludeTrashed)
            .await
    }

    /// List live folders directly under `parent_id`, or top-level ones.
    pub async fn list(&self, user_id: &str, parent_id: Option<&str>) -> AppResult<Vec<folder::Model>> {
        self.folder_repo
            .find_by_user(user_id, parent_id, TrashScope::ExcludeTrashed)
            .await
    }

    /// Move a folder, its live descendants and their documents to the trash.
    ///
    /// Everything is stamped with the same `deleted_at` so that a later
    /// restore brings back exactly this batch. The documents then age on the
    /// document retention window, which is shorter than the folder one.
    pub async fn trash(&self, user_id: &str, id: &str) -> AppResult<TrashedTree> {
        let root = self
            .folder_repo
            .find_owned(user_id, id, TrashScope::ExcludeTrashed)
            .await?;

        let tree = collect_subtree(&self.folder_repo, root, TrashScope::ExcludeTrashed, |_| true).await?;
        let ids: Vec<String> = tree.into_iter().map(|f| f.id).collect();
        // Postgres keeps microseconds; the restore match must compare equal.
        let at = Utc::now().trunc_subsecs(6).into();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        let folders = self
            .folder_repo
            .trash_many(&txn, &ids, at)
            .await
            .map_err(AppError::in_transaction)?;
        let documents = self
            .document_repo
            .trash_in_folders(&txn, &ids, at)
            .await
            .map_err(AppError::in_transaction)?;

        txn.commit()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        info!(folder_id = %id, folders, documents, "Moved folder tree to trash");
        Ok(TrashedTree { folders, documents })
    }

    /// Restore a trashed folder and whatever was trashed along with it.
    ///
    /// Descendants trashed separately, earlier or later, stay in the trash.
    /// If the parent is no longer live the folder moves to the top level.
    pub async fn restore(&self, user_id: &str, id: &str) -> AppResult<TrashedTree> {
        let root = self
            .folder_repo
            .find_owned(user_id, id, TrashScope::OnlyTrashed)
            .await?;
        let Some(at) = root.deleted_at else {
            return Err(AppError::FolderNotFound(id.to_string()));
        };

        let parent_is_live = match &root.parent_id {
            Some(parent_id) => self
                .folder_repo
                .find_by_id(parent_id, TrashScope::ExcludeTrashed)
                .await?
                .is_some(),
            None => true,
        };

        let tree = collect_subtree(&self.folder_repo, root.clone(), TrashScope::OnlyTrashed, |f| {
            f.deleted_at == Some(at)
        })
        .await?;
        let ids: Vec<String> = tree.into_iter().map(|f| f.id).collect();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        let folders = self
            .folder_repo
            .restore_many(&txn, &ids, at)
            .await
            .map_err(AppError::in_transaction)?;
        let documents = self
            .document_repo
            .restore_in_folders(&txn, &ids, at)
            .await
            .map_err(AppError::in_transaction)?;

        if !parent_is_live {
            let mut active: folder::ActiveModel = root.into();
            active.parent_id = Set(None);
            active.deleted_at = Set(None);
            active.updated_at = Set(Utc::now().into());
            self.folder_repo
                .update(&txn, active)
                .await
                .map_err(AppError::in_transaction)?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        info!(folder_id = %id, folders, documents, "Restored folder tree");
        Ok(TrashedTree { folders, documents })
    }

    /// Permanently delete a folder tree, trashed or not.
    pub async fn force_delete(&self, user_id: &str, id: &str) -> AppResult<FolderPurge> {
        let folder = self
            .folder_repo
            .find_owned(user_id, id, TrashScope::WithTrashed)
            .await?;
        self.purger.purge_folder_tree(&folder.id).await
    }
}
