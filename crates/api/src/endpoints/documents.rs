//! Document endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, post},
};
use marknest_common::AppResult;
use marknest_core::{CreateDocumentInput, DuplicateDocumentInput, PageRequest, UpdateDocumentInput};
use marknest_db::{
    entities::document::{self, DocumentStatus},
    repositories::DocumentFilter,
};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Paginated, ok},
};

/// Document response.
#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub user_id: String,
    pub folder_id: Option<String>,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub rendered_html: String,
    pub size: i64,
    pub word_count: i32,
    pub char_count: i32,
    pub version_number: i32,
    pub tags: Vec<String>,
    pub status: DocumentStatus,
    pub is_favorite: bool,
    pub is_archived: bool,
    pub is_trashed: bool,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl From<document::Model> for DocumentResponse {
    fn from(d: document::Model) -> Self {
        Self {
            tags: d.tag_list(),
            id: d.id,
            user_id: d.user_id,
            folder_id: d.folder_id,
            title: d.title,
            slug: d.slug,
            content: d.content,
            rendered_html: d.rendered_html,
            size: d.size,
            word_count: d.word_count,
            char_count: d.char_count,
            version_number: d.version_number,
            status: d.status,
            is_favorite: d.is_favorite,
            is_archived: d.is_archived,
            is_trashed: d.is_trashed,
            created_at: d.created_at.to_rfc3339(),
            updated_at: d.updated_at.to_rfc3339(),
            deleted_at: d.deleted_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// List documents query.
#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    pub folder_id: Option<String>,
    pub status: Option<DocumentStatus>,
    pub favorite: Option<bool>,
    pub archived: Option<bool>,
    pub tag: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl ListDocumentsQuery {
    fn split(self) -> (DocumentFilter, PageRequest) {
        let defaults = PageRequest::default();
        let page = PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.per_page.unwrap_or(defaults.per_page),
        );
        let filter = DocumentFilter {
            folder_id: self.folder_id,
            status: self.status,
            is_favorite: self.favorite,
            is_archived: self.archived,
            tag: self.tag.filter(|t| !t.trim().is_empty()),
        };
        (filter, page)
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create).get(list))
        .route("/{id}", get(show).put(update).delete(trash))
        .route("/{id}/restore", post(restore))
        .route("/{id}/force", delete(force_delete))
        .route("/{id}/duplicate", post(duplicate))
}

/// Create a document.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateDocumentInput>,
) -> AppResult<ApiResponse<DocumentResponse>> {
    let document = state.document_service.create(&user.id, input).await?;
    Ok(ApiResponse::created(document.into()))
}

/// List the caller's documents.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListDocumentsQuery>,
) -> AppResult<ApiResponse<Paginated<DocumentResponse>>> {
    let (filter, page) = query.split();
    let (documents, total) = state.document_service.list(&user.id, &filter, page).await?;
    Ok(ApiResponse::ok(Paginated::from_rows(documents, total, page)))
}

/// Show a document.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DocumentResponse>> {
    let document = state.document_service.get(&user.id, &id).await?;
    Ok(ApiResponse::ok(document.into()))
}

/// Partially update a document.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateDocumentInput>,
) -> AppResult<ApiResponse<DocumentResponse>> {
    let document = state.document_service.update(&user.id, &id, input).await?;
    Ok(ApiResponse::ok(document.into()))
}

/// Move a document to the trash.
async fn trash(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DocumentResponse>> {
    let document = state.document_service.trash(&user.id, &id).await?;
    Ok(ApiResponse::ok(document.into()))
}

/// Restore a document from the trash.
async fn restore(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DocumentResponse>> {
    let document = state.document_service.restore(&user.id, &id).await?;
    Ok(ApiResponse::ok(document.into()))
}

/// Permanently delete a document.
async fn force_delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.document_service.force_delete(&user.id, &id).await?;
    Ok(ok())
}

/// Duplicate a document.
async fn duplicate(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<DuplicateDocumentInput>>,
) -> AppResult<ApiResponse<DocumentResponse>> {
    let input = body.map(|Json(input)| input).unwrap_or_default();
    let document = state.document_service.duplicate(&user.id, &id, input).await?;
    Ok(ApiResponse::created(document.into()))
}
