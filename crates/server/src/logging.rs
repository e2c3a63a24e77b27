//! Tracing setup.

use std::path::Path;

use anyhow::Context;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer, filter::Targets, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Install the global subscriber.
///
/// Console output is filtered by `RUST_LOG`. When `log_file` is set, sweep
/// and scheduler events are also appended to that file. Keep the returned
/// guard alive for the life of the process so buffered lines are flushed.
pub fn init(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let console = tracing_subscriber::fmt::layer().with_filter(
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "marknest=debug,tower_http=debug".into()),
    );

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(console).init();
        return Ok(None);
    };

    let file_name = path
        .file_name()
        .context("scheduler.log_file must name a file")?;
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;

    // `never` rotates nothing and opens the file in append mode.
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(
            Targets::new()
                .with_target("marknest_queue", Level::INFO)
                .with_target("marknest_core::services::trash", Level::INFO)
                .with_target("marknest_core::services::purge", Level::INFO)
                .with_target("marknest::cleanup", Level::INFO),
        );

    tracing_subscriber::registry().with(console).with(file).init();
    Ok(Some(guard))
}
