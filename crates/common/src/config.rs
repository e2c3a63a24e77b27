//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Document versioning configuration.
    #[serde(default)]
    pub versioning: VersioningConfig,
    /// Trash retention configuration.
    #[serde(default)]
    pub trash: TrashConfig,
    /// Media storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Scheduled job configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Document versioning configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VersioningConfig {
    /// Number of auto-save versions kept by auto-save pruning.
    #[serde(default = "default_auto_save_keep")]
    pub auto_save_keep: u64,
    /// Maximum document title length.
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,
}

impl Default for VersioningConfig {
    fn default() -> Self {
        Self {
            auto_save_keep: default_auto_save_keep(),
            max_title_length: default_max_title_length(),
        }
    }
}

/// Trash retention configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TrashConfig {
    /// Days a trashed document stays restorable.
    #[serde(default = "default_document_retention_days")]
    pub document_retention_days: u32,
    /// Days a trashed folder stays restorable.
    #[serde(default = "default_folder_retention_days")]
    pub folder_retention_days: u32,
}

impl Default for TrashConfig {
    fn default() -> Self {
        Self {
            document_retention_days: default_document_retention_days(),
            folder_retention_days: default_folder_retention_days(),
        }
    }
}

/// Media storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for attachment blobs.
    #[serde(default = "default_media_path")]
    pub media_path: PathBuf,
    /// Base URL attachments are served from.
    #[serde(default = "default_media_url")]
    pub media_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_path: default_media_path(),
            media_url: default_media_url(),
        }
    }
}

/// Scheduled job configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Whether the in-process scheduler runs alongside the server.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Daily time (UTC, `HH:MM`) for the document trash sweep.
    #[serde(default = "default_documents_at")]
    pub documents_at: String,
    /// Daily time (UTC, `HH:MM`) for the folder trash sweep.
    #[serde(default = "default_folders_at")]
    pub folders_at: String,
    /// File scheduled job output is appended to.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            documents_at: default_documents_at(),
            folders_at: default_folders_at(),
            log_file: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_auto_save_keep() -> u64 {
    50
}

const fn default_max_title_length() -> usize {
    255
}

const fn default_document_retention_days() -> u32 {
    30
}

const fn default_folder_retention_days() -> u32 {
    90
}

fn default_media_path() -> PathBuf {
    PathBuf::from("./storage/media")
}

fn default_media_url() -> String {
    "/media".to_string()
}

fn default_documents_at() -> String {
    "02:00".to_string()
}

fn default_folders_at() -> String {
    "03:00".to_string()
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `MARKNEST_ENV`)
    /// 4. Environment variables with `MARKNEST__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let _ = dotenvy::dotenv();
        let env = std::env::var("MARKNEST_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MARKNEST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("MARKNEST")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_retention_windows() {
        let trash = TrashConfig::default();
        assert_eq!(trash.document_retention_days, 30);
        assert_eq!(trash.folder_retention_days, 90);

        let scheduler = SchedulerConfig::default();
        assert_eq!(scheduler.documents_at, "02:00");
        assert!(scheduler.enabled);
    }

    #[test]
    fn test_optional_sections_fall_back_to_defaults() {
        let config: Config = config::Config::builder()
            .set_override("server.url", "http://localhost:3000")
            .unwrap()
            .set_override("database.url", "postgres://localhost/marknest")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.versioning.auto_save_keep, 50);
        assert_eq!(config.trash.document_retention_days, 30);
        assert!(config.scheduler.log_file.is_none());
    }
}
