//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use marknest_common::{Config, LocalStorage, MediaStorage};
use marknest_core::{DocumentService, DocumentVersionService, FolderService, Purger};
use marknest_db::repositories::{
    DocumentRepository, DocumentVersionRepository, FolderRepository, UserRepository,
};
use sea_orm::DatabaseConnection;
use tracing::debug;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_repo: UserRepository,
    pub document_service: DocumentService,
    pub version_service: DocumentVersionService,
    pub folder_service: FolderService,
}

impl AppState {
    /// Wire services over a shared connection and attachment storage.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &Config, storage: Arc<dyn MediaStorage>) -> Self {
        let document_repo = DocumentRepository::new(Arc::clone(&db));
        let version_repo = DocumentVersionRepository::new(Arc::clone(&db));
        let folder_repo = FolderRepository::new(Arc::clone(&db));
        let purger = Purger::new(Arc::clone(&db), storage);

        Self {
            user_repo: UserRepository::new(Arc::clone(&db)),
            document_service: DocumentService::new(
                Arc::clone(&db),
                document_repo.clone(),
                version_repo.clone(),
                folder_repo.clone(),
                purger.clone(),
                config.versioning.clone(),
            ),
            version_service: DocumentVersionService::new(
                Arc::clone(&db),
                document_repo.clone(),
                version_repo,
                config.versioning.clone(),
            ),
            folder_service: FolderService::new(db, folder_repo, document_repo, purger),
        }
    }

    /// State backed by the configured local media directory.
    #[must_use]
    pub fn with_local_storage(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        let storage = Arc::new(LocalStorage::new(
            config.storage.media_path.clone(),
            config.storage.media_url.clone(),
        ));
        Self::new(db, config, storage)
    }
}

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to a user and stores it in the
/// request extensions. Requests without a valid token pass through
/// unauthenticated; handlers that need a user reject them.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_repo.find_by_token(token.trim()).await {
            Ok(Some(user)) => {
                req.extensions_mut().insert(user);
            }
            Ok(None) => debug!("Unknown bearer token"),
            Err(e) => debug!(error = %e, "Token lookup failed"),
        }
    }

    next.run(req).await
}
