//! Core business logic for marknest.
//!
//! Services own every multi-row mutation: each one runs inside a single
//! database transaction, so a failure part way through leaves nothing behind.

pub mod services;

pub use services::*;
