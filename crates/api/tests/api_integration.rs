//! API integration tests.
//!
//! These tests drive the router end to end against a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    middleware,
};
use chrono::Utc;
use marknest_api::{middleware::AppState, router as api_router};
use marknest_common::config::{
    Config, DatabaseConfig, SchedulerConfig, ServerConfig, StorageConfig, TrashConfig,
    VersioningConfig,
};
use marknest_db::entities::{
    document::{self, DocumentStatus},
    document_version::{self, VersionOperation},
    folder, user,
};
use sea_orm::{DatabaseBackend, MockDatabase, Value};
use serde_json::{Value as Json, json};
use tower::ServiceExt;

const TOKEN: &str = "secret-token";

/// Create a test configuration.
fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            url: "http://localhost:3000".to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://localhost/test".to_string(),
            max_connections: 10,
            min_connections: 1,
        },
        versioning: VersioningConfig::default(),
        trash: TrashConfig::default(),
        storage: StorageConfig {
            media_path: std::env::temp_dir().join("marknest-api-test"),
            media_url: "/media".to_string(),
        },
        scheduler: SchedulerConfig::default(),
    }
}

fn test_user() -> user::Model {
    user::Model {
        id: "user1".to_string(),
        username: "alice".to_string(),
        token: TOKEN.to_string(),
        created_at: Utc::now().into(),
    }
}

fn test_document(id: &str, user_id: &str) -> document::Model {
    let now = Utc::now().into();
    document::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        folder_id: None,
        title: "Notes".to_string(),
        slug: format!("notes-{id}"),
        content: "hello **world**".to_string(),
        rendered_html: "<p>hello <strong>world</strong></p>".to_string(),
        size: 15,
        word_count: 2,
        char_count: 15,
        version_number: 2,
        tags: json!(["work"]),
        status: DocumentStatus::Draft,
        is_favorite: false,
        is_archived: false,
        is_trashed: false,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

fn test_version(document: &document::Model, number: i32) -> document_version::Model {
    document_version::Model {
        id: format!("{}-v{number}", document.id),
        document_id: document.id.clone(),
        user_id: document.user_id.clone(),
        version_number: number,
        title: document.title.clone(),
        content: "hello".to_string(),
        rendered_html: "<p>hello</p>".to_string(),
        size: 5,
        word_count: 1,
        char_count: 5,
        change_summary: None,
        operation: VersionOperation::Create,
        is_auto_save: false,
        created_at: Utc::now().into(),
    }
}

/// Build the app the way the server does, on top of `db`.
fn create_test_router(db: MockDatabase) -> Router {
    let state = AppState::with_local_storage(Arc::new(db.into_connection()), &create_test_config());
    Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            marknest_api::middleware::auth_middleware,
        ))
        .with_state(state)
}

/// Mock database whose first query resolves the bearer token.
fn authed_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[test_user()]])
}

fn request(method: &str, uri: &str, body: Option<Json>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Json {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = create_test_router(MockDatabase::new(DatabaseBackend::Postgres));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/documents")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()]);
    let app = create_test_router(db);

    let response = app
        .oneshot(request("GET", "/api/documents/doc1", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_show_document() {
    let db = authed_db().append_query_results([[test_document("doc1", "user1")]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(request("GET", "/api/documents/doc1", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["id"], "doc1");
    assert_eq!(body["data"]["status"], "draft");
    assert_eq!(body["data"]["tags"], json!(["work"]));
    assert_eq!(body["data"]["version_number"], 2);
}

#[tokio::test]
async fn test_foreign_document_is_not_found() {
    let db = authed_db().append_query_results([[test_document("doc1", "someone_else")]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(request("GET", "/api/documents/doc1", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "DOCUMENT_NOT_FOUND");
}

#[tokio::test]
async fn test_create_with_blank_title_is_rejected() {
    let app = create_test_router(authed_db());

    let response = app
        .oneshot(request(
            "POST",
            "/api/documents",
            Some(json!({ "title": "", "content": "body" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_document_returns_created() {
    let mut created = test_document("doc1", "user1");
    created.version_number = 1;
    let version = test_version(&created, 1);
    let db = authed_db()
        .append_query_results([[created]])
        .append_query_results([[version]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(request(
            "POST",
            "/api/documents",
            Some(json!({ "title": "Notes", "content": "hello **world**", "tags": ["work"] })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["version_number"], 1);
}

#[tokio::test]
async fn test_list_documents_is_paginated() {
    let db = authed_db()
        .append_query_results([vec![
            test_document("doc1", "user1"),
            test_document("doc2", "user1"),
        ]])
        .append_query_results([[maplit::btreemap! {
            "num_items" => Value::BigInt(Some(12))
        }]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(request(
            "GET",
            "/api/documents?tag=work&favorite=false&page=2&per_page=2",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["total"], 12);
    assert_eq!(body["data"]["page"], 2);
    assert_eq!(body["data"]["per_page"], 2);
}

#[tokio::test]
async fn test_show_missing_version() {
    let db = authed_db()
        .append_query_results([[test_document("doc1", "user1")]])
        .append_query_results([Vec::<document_version::Model>::new()]);
    let app = create_test_router(db);

    let response = app
        .oneshot(request("GET", "/api/documents/doc1/versions/9", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VERSION_NOT_FOUND");
}

#[tokio::test]
async fn test_diff_against_current_document() {
    let document = test_document("doc1", "user1");
    let v1 = test_version(&document, 1);
    let db = authed_db()
        .append_query_results([[document]])
        .append_query_results([[v1]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(request("GET", "/api/documents/doc1/versions/1/diff", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["version"], 1);
    assert_eq!(body["data"]["against"], Json::Null);
    assert_eq!(body["data"]["content_changed"], true);
    assert_eq!(body["data"]["title_changed"], false);
    assert_eq!(body["data"]["word_count_delta"], 1);
}

#[tokio::test]
async fn test_create_folder() {
    let now = Utc::now().into();
    let created = folder::Model {
        id: "f1".to_string(),
        user_id: "user1".to_string(),
        name: "Projects".to_string(),
        parent_id: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };
    let db = authed_db().append_query_results([[created]]);
    let app = create_test_router(db);

    let response = app
        .oneshot(request("POST", "/api/folders", Some(json!({ "name": "Projects" }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["name"], "Projects");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(MockDatabase::new(DatabaseBackend::Postgres));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
