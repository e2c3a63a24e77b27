//! Document service.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use marknest_common::{AppError, AppResult, IdGenerator, VersioningConfig};
use marknest_db::{
    TrashScope,
    entities::{
        document::{self, DocumentStatus},
        document_version::VersionOperation,
    },
    repositories::{DocumentFilter, DocumentRepository, DocumentVersionRepository, FolderRepository},
};
use marknest_markup::{TextStats, to_html};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};
use validator::Validate;

use super::document_version::{VersionMeta, next_version_number, prune_auto_saves, snapshot_of};
use super::purge::Purger;
use super::{PageRequest, deserialize_present};

/// Input for creating a document.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDocumentInput {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[serde(default)]
    pub content: String,

    pub folder_id: Option<String>,

    #[serde(default)]
    #[validate(length(max = 50))]
    pub tags: Vec<String>,

    #[serde(default)]
    pub status: DocumentStatus,
}

/// Input for a partial document update. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDocumentInput {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    pub content: Option<String>,

    /// None = no change, Some(None) = move to top level, Some(Some(id)) = move.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub folder_id: Option<Option<String>>,

    #[validate(length(max = 50))]
    pub tags: Option<Vec<String>>,

    pub status: Option<DocumentStatus>,

    pub is_favorite: Option<bool>,

    pub is_archived: Option<bool>,

    /// Marks the resulting version as an auto-save.
    #[serde(default)]
    pub is_auto_save: bool,

    /// Annotates the resulting version.
    #[validate(length(max = 1000))]
    pub change_summary: Option<String>,
}

impl UpdateDocumentInput {
    /// Whether this update produces a new version.
    #[must_use]
    pub const fn creates_version(&self) -> bool {
        self.title.is_some() || self.content.is_some()
    }
}

/// Input for duplicating a document.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DuplicateDocumentInput {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,

    pub folder_id: Option<String>,
}

/// Lowercase a title into a URL slug.
///
/// Runs of anything other than letters and digits collapse into a single
/// `-`; leading and trailing dashes are dropped.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    slug.chars().take(200).collect::<String>().trim_end_matches('-').to_string()
}

/// Slug stored for a document: the slugified title suffixed with the ID.
pub(crate) fn slug_for(title: &str, id: &str) -> String {
    match slugify(title) {
        s if s.is_empty() => id.to_string(),
        s => format!("{s}-{id}"),
    }
}

/// Trim tags, drop blanks and duplicates, keep first-seen order.
#[must_use]
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Document service for creating, editing and trashing documents.
#[derive(Clone)]
pub struct DocumentService {
    db: Arc<DatabaseConnection>,
    document_repo: DocumentRepository,
    version_repo: DocumentVersionRepository,
    folder_repo: FolderRepository,
    purger: Purger,
    id_gen: IdGenerator,
    config: VersioningConfig,
}

impl DocumentService {
    /// Create a new document service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        document_repo: DocumentRepository,
        version_repo: DocumentVersionRepository,
        folder_repo: FolderRepository,
        purger: Purger,
        config: VersioningConfig,
    ) -> Self {
        Self {
            db,
            document_repo,
            version_repo,
            folder_repo,
            purger,
            id_gen: IdGenerator::new(),
            config,
        }
    }

    fn check_title(&self, title: &str) -> AppResult<()> {
        if title.trim().is_empty() {
            return Err(AppError::Validation("title: must not be blank".to_string()));
        }
        if title.chars().count() > self.config.max_title_length {
            return Err(AppError::Validation(format!(
                "title: must be at most {} characters",
                self.config.max_title_length
            )));
        }
        Ok(())
    }

    /// Make sure a folder exists, is live, and belongs to the user.
    async fn check_folder(&self, user_id: &str, folder_id: &str) -> AppResult<()> {
        self.folder_repo
            .find_owned(user_id, folder_id, TrashScope::ExcludeTrashed)
            .await
            .map(|_| ())
    }

    /// Get a live document owned by the user.
    pub async fn get(&self, user_id: &str, id: &str) -> AppResult<document::Model> {
        self.document_repo
            .find_owned(user_id, id, TrashScope::ExcludeTrashed)
            .await
    }

    /// List the user's live documents with the total count.
    pub async fn list(
        &self,
        user_id: &str,
        filter: &DocumentFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<document::Model>, u64)> {
        let documents = self
            .document_repo
            .find_by_user(user_id, filter, page.limit(), page.offset())
            .await?;
        let total = self.document_repo.count_by_user(user_id, filter).await?;
        Ok((documents, total))
    }

    /// Create a document together with its first version.
    pub async fn create(
        &self,
        user_id: &str,
        input: CreateDocumentInput,
    ) -> AppResult<document::Model> {
        input.validate()?;
        self.check_title(&input.title)?;
        if let Some(folder_id) = &input.folder_id {
            self.check_folder(user_id, folder_id).await?;
        }

        let id = self.id_gen.generate();
        let stats = TextStats::of(&input.content);
        let now = Utc::now().into();

        let model = document::ActiveModel {
            id: Set(id.clone()),
            user_id: Set(user_id.to_string()),
            folder_id: Set(input.folder_id),
            title: Set(input.title),
            slug: Set(id.clone()),
            rendered_html: Set(to_html(&input.content)),
            content: Set(input.content),
            size: Set(stats.bytes),
            word_count: Set(stats.words),
            char_count: Set(stats.chars),
            version_number: Set(1),
            tags: Set(json!(normalize_tags(input.tags))),
            status: Set(input.status),
            is_favorite: Set(false),
            is_archived: Set(false),
            is_trashed: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        let created = self
            .document_repo
            .create(&txn, model)
            .await
            .map_err(AppError::in_transaction)?;

        let version = snapshot_of(
            &created,
            self.id_gen.generate(),
            user_id,
            VersionMeta {
                operation: VersionOperation::Create,
                change_summary: None,
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

        info!(document_id = %created.id, user_id = %user_id, "Created document");
        Ok(created)
    }

    /// Apply a partial update.
    ///
    /// A new version is appended only when `title` or `content` is present.
    /// Tag, status, flag and folder changes update the document in place.
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        input: UpdateDocumentInput,
    ) -> AppResult<document::Model> {
        input.validate()?;
        if let Some(title) = &input.title {
            self.check_title(title)?;
        }

        let document = self
            .document_repo
            .find_owned(user_id, id, TrashScope::ExcludeTrashed)
            .await?;

        if let Some(Some(folder_id)) = &input.folder_id {
            self.check_folder(user_id, folder_id).await?;
        }

        let creates_version = input.creates_version();
        let mut active: document::ActiveModel = document.clone().into();

        if let Some(title) = input.title {
            active.slug = Set(slug_for(&title, &document.id));
            active.title = Set(title);
        }
        if let Some(content) = input.content {
            let stats = TextStats::of(&content);
            active.rendered_html = Set(to_html(&content));
            active.size = Set(stats.bytes);
            active.word_count = Set(stats.words);
            active.char_count = Set(stats.chars);
            active.content = Set(content);
        }
        if let Some(folder_id) = input.folder_id {
            active.folder_id = Set(folder_id);
        }
        if let Some(tags) = input.tags {
            active.tags = Set(json!(normalize_tags(tags)));
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(is_favorite) = input.is_favorite {
            active.is_favorite = Set(is_favorite);
        }
        if let Some(is_archived) = input.is_archived {
            active.is_archived = Set(is_archived);
        }
        active.updated_at = Set(Utc::now().into());

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        if creates_version {
            let next = next_version_number(&self.version_repo, &txn, &document)
                .await
                .map_err(AppError::in_transaction)?;
            active.version_number = Set(next);
        }

        let updated = self
            .document_repo
            .update(&txn, active)
            .await
            .map_err(AppError::in_transaction)?;

        if creates_version {
            let version = snapshot_of(
                &updated,
                self.id_gen.generate(),
                user_id,
                VersionMeta {
                    operation: VersionOperation::Update,
                    change_summary: input.change_summary,
                    is_auto_save: input.is_auto_save,
                },
            );
            self.version_repo
                .create(&txn, version)
                .await
                .map_err(AppError::in_transaction)?;

            if input.is_auto_save {
                let pruned = prune_auto_saves(
                    &self.version_repo,
                    &txn,
                    &updated.id,
                    self.config.auto_save_keep,
                )
                .await
                .map_err(AppError::in_transaction)?;
                if pruned > 0 {
                    debug!(document_id = %updated.id, pruned, "Pruned auto-save versions");
                }
            }
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        info!(
            document_id = %updated.id,
            version = updated.version_number,
            new_version = creates_version,
            "Updated document"
        );
        Ok(updated)
    }

    /// Copy a document into a new draft with its own history.
    ///
    /// The copy keeps content and tags but nothing links it back to the
    /// source except the summary of its first version.
    pub async fn duplicate(
        &self,
        user_id: &str,
        id: &str,
        input: DuplicateDocumentInput,
    ) -> AppResult<document::Model> {
        input.validate()?;

        let source = self
            .document_repo
            .find_owned(user_id, id, TrashScope::ExcludeTrashed)
            .await?;

        let folder_id = match input.folder_id {
            Some(folder_id) => {
                self.check_folder(user_id, &folder_id).await?;
                Some(folder_id)
            }
            None => source.folder_id.clone(),
        };

        let title = match input.title {
            Some(title) => {
                self.check_title(&title)?;
                title
            }
            None => format!("Copy of {}", source.title)
                .chars()
                .take(self.config.max_title_length)
                .collect(),
        };

        let new_id = self.id_gen.generate();
        let now = Utc::now().into();

        let model = document::ActiveModel {
            id: Set(new_id.clone()),
            user_id: Set(user_id.to_string()),
            folder_id: Set(folder_id),
            title: Set(title),
            slug: Set(new_id.clone()),
            content: Set(source.content.clone()),
            rendered_html: Set(source.rendered_html.clone()),
            size: Set(source.size),
            word_count: Set(source.word_count),
            char_count: Set(source.char_count),
            version_number: Set(1),
            tags: Set(source.tags.clone()),
            status: Set(DocumentStatus::Draft),
            is_favorite: Set(false),
            is_archived: Set(false),
            is_trashed: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Transaction(e.to_string()))?;

        let copy = self
            .document_repo
            .create(&txn, model)
            .await
            .map_err(AppError::in_transaction)?;

        let version = snapshot_of(
            &copy,
            self.id_gen.generate(),
            user_id,
            VersionMeta {
                operation: VersionOperation::Create,
                change_summary: Some(format!("Duplicated from document {}", source.id)),
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

        info!(document_id = %copy.id, source_id = %source.id, "Duplicated document");
        Ok(copy)
    }

    /// Move a document to the trash.
    pub async fn trash(&self, user_id: &str, id: &str) -> AppResult<document::Model> {
        let document = self
            .document_repo
            .find_owned(user_id, id, TrashScope::ExcludeTrashed)
            .await?;

        let mut active: document::ActiveModel = document.into();
        active.is_trashed = Set(true);
        active.deleted_at = Set(Some(Utc::now().into()));

        let trashed = self
            .document_repo
            .update(self.db.as_ref(), active)
            .await?;

        info!(document_id = %trashed.id, "Moved document to trash");
        Ok(trashed)
    }

    /// Take a document back out of the trash.
    ///
    /// If its folder is gone or itself trashed, the document lands at the
    /// top level instead.
    pub async fn restore(&self, user_id: &str, id: &str) -> AppResult<document::Model> {
        let document = self
            .document_repo
            .find_owned(user_id, id, TrashScope::OnlyTrashed)
            .await?;

        let folder_is_live = match &document.folder_id {
            Some(folder_id) => self
                .folder_repo
                .find_by_id(folder_id, TrashScope::ExcludeTrashed)
                .await?
                .is_some(),
            None => true,
        };

        let mut active: document::ActiveModel = document.into();
        active.is_trashed = Set(false);
        active.deleted_at = Set(None);
        if !folder_is_live {
            active.folder_id = Set(None);
        }

        let restored = self
            .document_repo
            .update(self.db.as_ref(), active)
            .await?;

        info!(document_id = %restored.id, "Restored document from trash");
        Ok(restored)
    }

    /// Permanently delete a document, trashed or not.
    pub async fn force_delete(&self, user_id: &str, id: &str) -> AppResult<()> {
        let document = self
            .document_repo
            .find_owned(user_id, id, TrashScope::WithTrashed)
            .await?;

        self.purger.purge_document(&document.id).await?;
        Ok(())
    }
}
