//! Marknest server entry point.

mod cleanup;
mod logging;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{Router, middleware};
use clap::{Args, Parser, Subcommand};
use marknest_api::{middleware::AppState, router as api_router};
use marknest_common::{Config, LocalStorage, MediaStorage};
use marknest_core::{Purger, TrashService};
use marknest_db::repositories::{DocumentRepository, FolderRepository};
use marknest_queue::{Schedule, TrashSweepExecutor, run_scheduler};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "marknest", version, about = "Document and note-taking backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server and the daily trash sweeps.
    Serve,

    /// Permanently delete documents that have been in the trash too long.
    #[command(name = "documents:cleanup-trashed")]
    DocumentsCleanupTrashed(CleanupArgs),

    /// Permanently delete folder trees that have been in the trash too long.
    #[command(name = "folders:cleanup-trashed")]
    FoldersCleanupTrashed(CleanupArgs),
}

#[derive(Args)]
struct CleanupArgs {
    /// Retention window in days (defaults to the configured value).
    #[arg(long)]
    days: Option<u32>,

    /// Skip the confirmation prompt.
    #[arg(long)]
    force: bool,
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn media_storage(config: &Config) -> Arc<dyn MediaStorage> {
    Arc::new(LocalStorage::new(
        config.storage.media_path.clone(),
        config.storage.media_url.clone(),
    ))
}

fn trash_service(db: &Arc<sea_orm::DatabaseConnection>, config: &Config) -> TrashService {
    TrashService::new(
        DocumentRepository::new(Arc::clone(db)),
        FolderRepository::new(Arc::clone(db)),
        Purger::new(Arc::clone(db), media_storage(config)),
    )
}

async fn serve(config: Config, db: Arc<sea_orm::DatabaseConnection>) -> anyhow::Result<()> {
    info!("Running database migrations...");
    marknest_db::migrate(&db).await?;
    info!("Migrations completed");

    if config.scheduler.enabled {
        let schedule = Schedule::from_config(&config.scheduler, &config.trash)?;
        let executor = Arc::new(TrashSweepExecutor::new(trash_service(&db, &config)));
        run_scheduler(&schedule, executor);
    } else {
        info!("Scheduler disabled");
    }

    let state = AppState::new(Arc::clone(&db), &config, media_storage(&config));

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            marknest_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let host: std::net::IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("invalid server.host '{}'", config.server.host))?;
    let addr = SocketAddr::from((host, config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load().context("failed to load configuration")?;

    let _log_guard = logging::init(config.scheduler.log_file.as_deref())?;

    let db = Arc::new(marknest_db::init(&config).await?);
    info!("Connected to database");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, db).await,
        Command::DocumentsCleanupTrashed(args) => {
            let days = args.days.unwrap_or(config.trash.document_retention_days);
            cleanup::documents(&trash_service(&db, &config), days, args.force).await
        }
        Command::FoldersCleanupTrashed(args) => {
            let days = args.days.unwrap_or(config.trash.folder_retention_days);
            cleanup::folders(&trash_service(&db, &config), days, args.force).await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["marknest"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cleanup_flags() {
        let cli =
            Cli::try_parse_from(["marknest", "folders:cleanup-trashed", "--days", "7", "--force"])
                .unwrap();
        match cli.command {
            Some(Command::FoldersCleanupTrashed(args)) => {
                assert_eq!(args.days, Some(7));
                assert!(args.force);
            }
            _ => panic!("expected folders:cleanup-trashed"),
        }
    }
}
