//! End-to-end tests for versioning and trash retention.
//!
//! These tests require a running `PostgreSQL` instance. Each test creates
//! its own database and drops it afterwards.
//! Run with: `cargo test -p marknest-core --test versioning_e2e -- --ignored`

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use marknest_common::{LocalStorage, MediaStorage, VersioningConfig};
use marknest_core::{
    CreateDocumentInput, CreateFolderInput, DocumentService, DocumentVersionService,
    DuplicateDocumentInput, FolderService, PageRequest, Purger, TrashService,
    UpdateDocumentInput,
};
use marknest_db::{
    entities::{
        Document, DocumentVersion, Folder,
        document::DocumentStatus,
        document_version::{self, VersionOperation},
    },
    repositories::{DocumentRepository, DocumentVersionRepository, FolderRepository},
    test_utils::TestDatabase,
};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseBackend, DatabaseConnection, EntityTrait, PaginatorTrait, Set,
    Statement,
};

struct Harness {
    db: TestDatabase,
    conn: Arc<DatabaseConnection>,
    documents: DocumentService,
    versions: DocumentVersionService,
    folders: FolderService,
    trash: TrashService,
}

impl Harness {
    async fn new() -> Self {
        let db = TestDatabase::create_unique()
            .await
            .expect("Failed to create test database");
        db.create_user("u1").await.unwrap();

        let conn = db.shared_connection().await.unwrap();
        let storage: Arc<dyn MediaStorage> = Arc::new(LocalStorage::new(
            std::env::temp_dir().join("marknest-e2e"),
            "/media".to_string(),
        ));
        let purger = Purger::new(conn.clone(), storage);
        let document_repo = DocumentRepository::new(conn.clone());
        let version_repo = DocumentVersionRepository::new(conn.clone());
        let folder_repo = FolderRepository::new(conn.clone());
        let config = VersioningConfig::default();

        Self {
            documents: DocumentService::new(
                conn.clone(),
                document_repo.clone(),
                version_repo.clone(),
                folder_repo.clone(),
                purger.clone(),
                config.clone(),
            ),
            versions: DocumentVersionService::new(
                conn.clone(),
                document_repo.clone(),
                version_repo,
                config,
            ),
            folders: FolderService::new(
                conn.clone(),
                folder_repo.clone(),
                document_repo.clone(),
                purger.clone(),
            ),
            trash: TrashService::new(document_repo, folder_repo, purger),
            conn,
            db,
        }
    }

    async fn document(&self, title: &str, folder_id: Option<&str>) -> String {
        self.documents
            .create(
                "u1",
                CreateDocumentInput {
                    title: title.to_string(),
                    content: "first draft".to_string(),
                    folder_id: folder_id.map(ToString::to_string),
                    tags: vec![],
                    status: DocumentStatus::Draft,
                },
            )
            .await
            .unwrap()
            .id
    }

    async fn folder(&self, name: &str, parent_id: Option<&str>) -> String {
        self.folders
            .create(
                "u1",
                CreateFolderInput {
                    name: name.to_string(),
                    parent_id: parent_id.map(ToString::to_string),
                },
            )
            .await
            .unwrap()
            .id
    }

    async fn version_numbers(&self, document_id: &str) -> Vec<i32> {
        let (versions, _) = self
            .versions
            .list_versions("u1", document_id, PageRequest::new(1, 100))
            .await
            .unwrap();
        versions.into_iter().map(|v| v.version_number).collect()
    }

    /// Push the trash timestamp of everything in `table` back by `days`.
    async fn age_trash(&self, table: &str, ids: &[&str], days: i64) {
        let list = ids.iter().map(|id| format!("'{id}'")).collect::<Vec<_>>().join(",");
        self.conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!(
                    "UPDATE \"{table}\" SET deleted_at = now() - interval '{days} days' WHERE id IN ({list})"
                ),
            ))
            .await
            .unwrap();
    }

    async fn finish(self) {
        drop(self.documents);
        drop(self.versions);
        drop(self.folders);
        drop(self.trash);
        drop(self.conn);
        self.db.drop_database().await.unwrap();
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_version_numbers_are_contiguous() {
    let h = Harness::new().await;
    let id = h.document("Notes", None).await;

    for n in 2..=4 {
        let input = UpdateDocumentInput {
            content: Some(format!("revision {n}")),
            ..Default::default()
        };
        let doc = h.documents.update("u1", &id, input).await.unwrap();
        assert_eq!(doc.version_number, n);
    }

    assert_eq!(h.version_numbers(&id).await, vec![4, 3, 2, 1]);
    h.finish().await;
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_restore_allocates_next_number() {
    let h = Harness::new().await;
    let id = h.document("Notes", None).await;
    let input = UpdateDocumentInput {
        title: Some("Renamed".to_string()),
        content: Some("second".to_string()),
        ..Default::default()
    };
    h.documents.update("u1", &id, input).await.unwrap();

    let restored = h.versions.restore_version("u1", &id, 1, None).await.unwrap();
    assert_eq!(restored.version_number, 3);
    assert_eq!(restored.title, "Notes");
    assert_eq!(restored.content, "first draft");
    assert_eq!(restored.slug, format!("notes-{id}"));

    let v3 = h.versions.get_version("u1", &id, 3).await.unwrap();
    assert_eq!(v3.operation, VersionOperation::Restore);
    assert_eq!(v3.change_summary.as_deref(), Some("Restored from version 1"));

    let diff = h.versions.diff_version("u1", &id, 1, None).await.unwrap();
    assert!(!diff.comparison.content_changed);
    h.finish().await;
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_tag_only_update_creates_no_version() {
    let h = Harness::new().await;
    let id = h.document("Notes", None).await;

    let input = UpdateDocumentInput {
        tags: Some(vec!["a".to_string(), "b".to_string()]),
        status: Some(DocumentStatus::Published),
        ..Default::default()
    };
    let doc = h.documents.update("u1", &id, input).await.unwrap();
    assert_eq!(doc.version_number, 1);
    assert_eq!(doc.tag_list(), vec!["a", "b"]);
    assert_eq!(h.version_numbers(&id).await, vec![1]);
    h.finish().await;
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_of_published_is_fresh_draft() {
    let h = Harness::new().await;
    let id = h.document("Notes", None).await;
    let input = UpdateDocumentInput {
        content: Some("final".to_string()),
        status: Some(DocumentStatus::Published),
        is_favorite: Some(true),
        ..Default::default()
    };
    h.documents.update("u1", &id, input).await.unwrap();

    let copy = h
        .documents
        .duplicate("u1", &id, DuplicateDocumentInput::default())
        .await
        .unwrap();
    assert_eq!(copy.title, "Copy of Notes");
    assert_eq!(copy.status, DocumentStatus::Draft);
    assert!(!copy.is_favorite);
    assert_eq!(copy.content, "final");
    assert_eq!(copy.version_number, 1);

    let (versions, total) = h
        .versions
        .list_versions("u1", &copy.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(versions[0].operation, VersionOperation::Create);
    assert_eq!(
        versions[0].change_summary,
        Some(format!("Duplicated from document {id}"))
    );
    h.finish().await;
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_document_retention_window() {
    let h = Harness::new().await;
    let old = h.document("Old", None).await;
    let recent = h.document("Recent", None).await;
    h.documents.trash("u1", &old).await.unwrap();
    h.documents.trash("u1", &recent).await.unwrap();
    h.age_trash("document", &[&old], 31).await;
    h.age_trash("document", &[&recent], 29).await;

    let report = h.trash.sweep_documents(30).await.unwrap();
    assert_eq!(report.attempted, 1);
    assert_eq!(report.succeeded, 1);

    assert!(Document::find_by_id(old.as_str()).one(h.conn.as_ref()).await.unwrap().is_none());
    assert!(Document::find_by_id(recent.as_str()).one(h.conn.as_ref()).await.unwrap().is_some());
    assert_eq!(DocumentVersion::find().count(h.conn.as_ref()).await.unwrap(), 1);

    // Nothing left to do on a second run.
    let again = h.trash.sweep_documents(30).await.unwrap();
    assert_eq!(again.attempted, 0);
    h.finish().await;
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_folder_cascade_leaves_no_rows() {
    let h = Harness::new().await;
    let a = h.folder("a", None).await;
    let b = h.folder("b", Some(&a)).await;
    let c = h.folder("c", Some(&b)).await;
    for folder in [&a, &b, &c] {
        h.document("Inside", Some(folder)).await;
    }

    let trashed = h.folders.trash("u1", &a).await.unwrap();
    assert_eq!(trashed.folders, 3);
    assert_eq!(trashed.documents, 3);
    h.age_trash("folder", &[&a, &b, &c], 91).await;

    let pending = h.trash.pending_folders(90).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, a);

    let report = h.trash.sweep_folders(90).await.unwrap();
    assert!(report.is_clean());
    assert_eq!(Folder::find().count(h.conn.as_ref()).await.unwrap(), 0);
    assert_eq!(Document::find().count(h.conn.as_ref()).await.unwrap(), 0);
    assert_eq!(DocumentVersion::find().count(h.conn.as_ref()).await.unwrap(), 0);
    h.finish().await;
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_trashed_child_of_live_parent_is_swept() {
    let h = Harness::new().await;
    let parent = h.folder("parent", None).await;
    let child = h.folder("child", Some(&parent)).await;

    h.folders.trash("u1", &child).await.unwrap();
    h.age_trash("folder", &[&child], 91).await;

    let report = h.trash.sweep_folders(90).await.unwrap();
    assert_eq!(report.succeeded, 1);
    assert!(Folder::find_by_id(child.as_str()).one(h.conn.as_ref()).await.unwrap().is_none());
    assert!(Folder::find_by_id(parent.as_str()).one(h.conn.as_ref()).await.unwrap().is_some());
    h.finish().await;
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_folder_restore_brings_back_same_batch() {
    let h = Harness::new().await;
    let root = h.folder("root", None).await;
    let early = h.folder("early", Some(&root)).await;
    let doc = h.document("Inside", Some(&root)).await;

    h.folders.trash("u1", &early).await.unwrap();
    h.folders.trash("u1", &root).await.unwrap();

    let restored = h.folders.restore("u1", &root).await.unwrap();
    assert_eq!(restored.folders, 1);
    assert_eq!(restored.documents, 1);
    assert!(h.documents.get("u1", &doc).await.is_ok());
    assert!(h.folders.get("u1", &early).await.is_err());
    h.finish().await;
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_cleanup_auto_saves_keeps_manual_versions() {
    let h = Harness::new().await;
    let id = h.document("Notes", None).await;

    // Replace the history with auto-saves v1..v8 and manual v9, v10.
    DocumentVersion::delete_many().exec(h.conn.as_ref()).await.unwrap();
    for n in 1..=10 {
        document_version::ActiveModel {
            id: Set(format!("{id}-{n}")),
            document_id: Set(id.clone()),
            user_id: Set("u1".to_string()),
            version_number: Set(n),
            title: Set("Notes".to_string()),
            content: Set(format!("v{n}")),
            rendered_html: Set(String::new()),
            size: Set(2),
            word_count: Set(1),
            char_count: Set(2),
            change_summary: Set(None),
            operation: Set(VersionOperation::Update),
            is_auto_save: Set(n <= 8),
            created_at: Set((Utc::now() - Duration::minutes(i64::from(10 - n))).into()),
        }
        .insert(h.conn.as_ref())
        .await
        .unwrap();
    }

    let deleted = h.versions.cleanup_auto_saves("u1", &id, Some(5)).await.unwrap();
    assert_eq!(deleted, 3);
    assert_eq!(h.version_numbers(&id).await, vec![10, 9, 8, 7, 6, 5, 4]);
    h.finish().await;
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_documents_in_trashed_folder_expire_on_document_window() {
    let h = Harness::new().await;
    let folder = h.folder("Archive", None).await;
    let doc = h.document("Inside", Some(&folder)).await;
    h.folders.trash("u1", &folder).await.unwrap();

    // Shift the shared stamp so folder and document stay in the same batch.
    for table in ["folder", "document"] {
        h.conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!(
                    "UPDATE \"{table}\" SET deleted_at = deleted_at - interval '45 days' WHERE deleted_at IS NOT NULL"
                ),
            ))
            .await
            .unwrap();
    }

    let report = h.trash.sweep_documents(30).await.unwrap();
    assert_eq!(report.succeeded, 1);
    assert!(h.trash.pending_folders(90).await.unwrap().is_empty());

    let restored = h.folders.restore("u1", &folder).await.unwrap();
    assert_eq!(restored.folders, 1);
    assert_eq!(restored.documents, 0);
    assert!(Document::find_by_id(doc.as_str()).one(h.conn.as_ref()).await.unwrap().is_none());
    h.finish().await;
}
