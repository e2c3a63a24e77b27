//! Permanent deletion of documents and folder trees.

use std::sync::Arc;

use marknest_common::{AppError, AppResult, MediaStorage};
use marknest_db::{
    TrashScope,
    repositories::{
        DocumentCollaboratorRepository, DocumentRepository, DocumentShareRepository,
        DocumentVersionRepository, FolderRepository, MediaAttachmentRepository,
    },
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use tracing::{info, warn};

use super::folder::collect_subtree;

/// What a document purge removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgedDocument {
    pub document_id: String,
    pub versions: u64,
    pub shares: u64,
    pub collaborators: u64,
    pub attachments: u64,
    /// Attachment blobs that could not be removed from storage.
    pub orphaned_blobs: Vec<String>,
}

/// What a folder tree purge removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderPurge {
    pub folders: u64,
    pub documents: Vec<PurgedDocument>,
}

/// Hard-deletes documents and folders along with everything they own.
#[derive(Clone)]
pub struct Purger {
    db: Arc<DatabaseConnection>,
    document_repo: DocumentRepository,
    version_repo: DocumentVersionRepository,
    share_repo: DocumentShareRepository,
    collaborator_repo: DocumentCollaboratorRepository,
    attachment_repo: MediaAttachmentRepository,
    folder_repo: FolderRepository,
    storage: Arc<dyn MediaStorage>,
}

impl Purger {
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, storage: Arc<dyn MediaStorage>) -> Self {
        Self {
            document_repo: DocumentRepository::new(db.clone()),
            version_repo: DocumentVersionRepository::new(db.clone()),
            share_repo: DocumentShareRepository::new(db.clone()),
            collaborator_repo: DocumentCollaboratorRepository::new(db.clone()),
            attachment_repo: MediaAttachmentRepository::new(db.clone()),
            folder_repo: FolderRepository::new(db.clone()),
            db,
            storage,
        }
    }

    /// Delete a document and its versions, shares, collaborators and
    /// attachments in one transaction.
    ///
    /// Attachment blobs are removed after commit. A blob that fails to
    /// delete is logged and reported, never rolled back.
    pub async fn purge_document(&self, document_id: &str) -> AppResult<PurgedDocument> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        let attachments = self
            .attachment_repo
            .find_by_document(&txn, document_id)
            .await
            .map_err(AppError::in_transaction)?;

        let versions = self
            .version_repo
            .delete_by_document(&txn, document_id)
            .await
            .map_err(AppError::in_transaction)?;
        let shares = self
            .share_repo
            .delete_by_document(&txn, document_id)
            .await
            .map_err(AppError::in_transaction)?;
        let collaborators = self
            .collaborator_repo
            .delete_by_document(&txn, document_id)
            .await
            .map_err(AppError::in_transaction)?;
        let attachment_rows = self
            .attachment_repo
            .delete_by_document(&txn, document_id)
            .await
            .map_err(AppError::in_transaction)?;
        self.document_repo
            .delete(&txn, document_id)
            .await
            .map_err(AppError::in_transaction)?;

        txn.commit()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        let mut orphaned_blobs = Vec::new();
        for attachment in attachments {
            if let Err(e) = self.storage.delete(&attachment.storage_key).await {
                warn!(
                    document_id = %document_id,
                    storage_key = %attachment.storage_key,
                    error = %e,
                    "Failed to delete attachment blob"
                );
                orphaned_blobs.push(attachment.storage_key);
            }
        }

        info!(document_id = %document_id, versions, attachments = attachment_rows, "Purged document");

        Ok(PurgedDocument {
            document_id: document_id.to_string(),
            versions,
            shares,
            collaborators,
            attachments: attachment_rows,
            orphaned_blobs,
        })
    }

    /// Delete a folder, every folder below it, and every document they hold.
    ///
    /// Best-effort, not atomic across the tree. Each document is purged in
    /// its own transaction and the folder rows are deleted children-first in
    /// a final one. The first failure aborts: documents already purged stay
    /// purged and the folders stay in place. A folder that no longer exists
    /// is a no-op.
    pub async fn purge_folder_tree(&self, folder_id: &str) -> AppResult<FolderPurge> {
        let Some(root) = self
            .folder_repo
            .find_by_id(folder_id, TrashScope::WithTrashed)
            .await?
        else {
            return Ok(FolderPurge::default());
        };

        let tree = collect_subtree(&self.folder_repo, root, TrashScope::WithTrashed, |_| true).await?;
        let folder_ids: Vec<String> = tree.iter().map(|f| f.id.clone()).collect();

        let mut documents = Vec::new();
        for document in self
            .document_repo
            .find_in_folders(&folder_ids, TrashScope::WithTrashed)
            .await?
        {
            documents.push(self.purge_document(&document.id).await?);
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        // Children before parents.
        for id in folder_ids.iter().rev() {
            self.folder_repo
                .delete(&txn, id)
                .await
                .map_err(AppError::in_transaction)?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        info!(
            folder_id = %folder_id,
            folders = folder_ids.len(),
            documents = documents.len(),
            "Purged folder tree"
        );

        Ok(FolderPurge {
            folders: folder_ids.len() as u64,
            documents,
        })
    }
}
