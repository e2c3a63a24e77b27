//! Document version endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use marknest_common::AppResult;
use marknest_core::{PageRequest, VersionDiff};
use marknest_db::entities::document_version::{self, VersionOperation};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::documents::DocumentResponse;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Paginated},
};

/// Version response.
#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub id: String,
    pub document_id: String,
    pub user_id: String,
    pub version_number: i32,
    pub title: String,
    pub content: String,
    pub rendered_html: String,
    pub size: i64,
    pub word_count: i32,
    pub char_count: i32,
    pub change_summary: Option<String>,
    pub operation: VersionOperation,
    pub is_auto_save: bool,
    pub created_at: String,
}

impl From<document_version::Model> for VersionResponse {
    fn from(v: document_version::Model) -> Self {
        Self {
            id: v.id,
            document_id: v.document_id,
            user_id: v.user_id,
            version_number: v.version_number,
            title: v.title,
            content: v.content,
            rendered_html: v.rendered_html,
            size: v.size,
            word_count: v.word_count,
            char_count: v.char_count,
            change_summary: v.change_summary,
            operation: v.operation,
            is_auto_save: v.is_auto_save,
            created_at: v.created_at.to_rfc3339(),
        }
    }
}

/// Restore version request.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RestoreVersionRequest {
    #[validate(length(max = 1000))]
    pub change_summary: Option<String>,
}

/// Diff query.
#[derive(Debug, Deserialize)]
pub struct DiffQuery {
    /// Version to compare against; the current document when absent.
    pub against: Option<i32>,
}

/// Cleanup request.
#[derive(Debug, Default, Deserialize)]
pub struct CleanupRequest {
    pub keep: Option<u64>,
}

/// Cleanup response.
#[derive(Debug, Serialize)]
pub struct CleanupResponse {
    pub deleted: u64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/versions", get(list))
        .route("/{id}/versions/cleanup", post(cleanup))
        .route("/{id}/versions/{version}", get(show))
        .route("/{id}/versions/{version}/restore", post(restore))
        .route("/{id}/versions/{version}/diff", get(diff))
}

/// List versions, newest first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(page): Query<PageRequest>,
) -> AppResult<ApiResponse<Paginated<VersionResponse>>> {
    let (versions, total) = state.version_service.list_versions(&user.id, &id, page).await?;
    Ok(ApiResponse::ok(Paginated::from_rows(versions, total, page)))
}

/// Show a single version.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, version)): Path<(String, i32)>,
) -> AppResult<ApiResponse<VersionResponse>> {
    let version = state.version_service.get_version(&user.id, &id, version).await?;
    Ok(ApiResponse::ok(version.into()))
}

/// Restore the document to a version.
async fn restore(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, version)): Path<(String, i32)>,
    body: Option<Json<RestoreVersionRequest>>,
) -> AppResult<ApiResponse<DocumentResponse>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    request.validate()?;

    let document = state
        .version_service
        .restore_version(&user.id, &id, version, request.change_summary)
        .await?;
    Ok(ApiResponse::ok(document.into()))
}

/// Compare a version with another one or with the current document.
async fn diff(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path((id, version)): Path<(String, i32)>,
    Query(query): Query<DiffQuery>,
) -> AppResult<ApiResponse<VersionDiff>> {
    let diff = state
        .version_service
        .diff_version(&user.id, &id, version, query.against)
        .await?;
    Ok(ApiResponse::ok(diff))
}

/// Prune old auto-save versions.
async fn cleanup(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<CleanupRequest>>,
) -> AppResult<ApiResponse<CleanupResponse>> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let deleted = state
        .version_service
        .cleanup_auto_saves(&user.id, &id, request.keep)
        .await?;
    Ok(ApiResponse::ok(CleanupResponse { deleted }))
}
