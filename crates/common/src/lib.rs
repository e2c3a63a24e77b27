//! Common utilities and shared types for marknest.
//!
//! This crate provides foundational components used across all marknest crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Storage**: Media attachment blob storage via [`MediaStorage`]
//!
//! # Example
//!
//! ```no_run
//! use marknest_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {} (documents kept {} days in trash)", id, config.trash.document_retention_days);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use config::{Config, SchedulerConfig, TrashConfig, VersioningConfig};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{LocalStorage, MediaStorage, generate_storage_key};
