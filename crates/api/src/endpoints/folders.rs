//! Folder endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use marknest_common::AppResult;
use marknest_core::{CreateFolderInput, FolderPurge, TrashedTree};
use marknest_db::entities::folder;
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Folder response.
#[derive(Debug, Serialize)]
pub struct FolderResponse {
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<folder::Model> for FolderResponse {
    fn from(f: folder::Model) -> Self {
        Self {
            id: f.id,
            name: f.name,
            parent_id: f.parent_id,
            created_at: f.created_at.to_rfc3339(),
            updated_at: f.updated_at.to_rfc3339(),
        }
    }
}

/// List folders query.
#[derive(Debug, Deserialize)]
pub struct ListFoldersQuery {
    /// Parent folder; top-level folders when absent.
    pub parent_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/{id}", get(show).delete(trash))
        .route("/{id}/restore", post(restore))
        .route("/{id}/force", delete(force_delete))
}

async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateFolderInput>,
) -> AppResult<ApiResponse<FolderResponse>> {
    let folder = state.folder_service.create(&user.id, input).await?;
    Ok(ApiResponse::created(folder.into()))
}

async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListFoldersQuery>,
) -> AppResult<ApiResponse<Vec<FolderResponse>>> {
    let folders = state
        .folder_service
        .list(&user.id, query.parent_id.as_deref())
        .await?;
    Ok(ApiResponse::ok(folders.into_iter().map(Into::into).collect()))
}

async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<FolderResponse>> {
    let folder = state.folder_service.get(&user.id, &id).await?;
    Ok(ApiResponse::ok(folder.into()))
}

/// Trash a folder along with everything below it.
async fn trash(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<TrashedTree>> {
    let trashed = state.folder_service.trash(&user.id, &id).await?;
    Ok(ApiResponse::ok(trashed))
}

async fn restore(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<TrashedTree>> {
    let restored = state.folder_service.restore(&user.id, &id).await?;
    Ok(ApiResponse::ok(restored))
}

/// Permanently delete a folder tree.
async fn force_delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<FolderPurge>> {
    let purged = state.folder_service.force_delete(&user.id, &id).await?;
    Ok(ApiResponse::ok(purged))
}
