//! HTTP API layer for marknest.
//!
//! JSON endpoints for documents, their version history and folders:
//!
//! - **Endpoints**: everything is mounted under `/api` by the server
//! - **Extractors**: [`extractors::AuthUser`] for bearer-token authentication
//! - **Middleware**: token resolution and the shared [`middleware::AppState`]
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
