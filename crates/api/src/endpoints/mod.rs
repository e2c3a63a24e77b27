//! API endpoints.

#![allow(missing_docs)]

mod documents;
mod folders;
mod versions;

use axum::Router;

use crate::middleware::AppState;

pub use documents::DocumentResponse;
pub use folders::FolderResponse;
pub use versions::VersionResponse;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/documents", documents::router().merge(versions::router()))
        .nest("/folders", folders::router())
}
