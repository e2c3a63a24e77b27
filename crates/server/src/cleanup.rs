//! `*:cleanup-trashed` commands.

use std::io::{self, BufRead, IsTerminal, Write};

use marknest_core::{SweepReport, TrashService};
use tracing::{info, warn};

/// Ask before purging. Non-interactive runs proceed without asking.
fn confirm(prompt: &str, force: bool) -> anyhow::Result<bool> {
    if force || !io::stdin().is_terminal() {
        return Ok(true);
    }

    print!("{prompt} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES" | "Yes"))
}

fn print_report(kind: &str, report: &SweepReport) {
    println!(
        "Purged {} of {} {kind}.",
        report.succeeded, report.attempted
    );
    for (id, cause) in &report.failed {
        warn!(id = %id, cause = %cause, "Could not purge {kind}");
        println!("  failed: {id}: {cause}");
    }
}

/// Purge documents trashed more than `days` ago.
pub async fn documents(trash: &TrashService, days: u32, force: bool) -> anyhow::Result<()> {
    let pending = trash.pending_documents(days).await?;
    if pending.is_empty() {
        println!("No documents have been in the trash for more than {days} days.");
        return Ok(());
    }

    let prompt = format!(
        "Permanently delete {} document(s) trashed more than {days} days ago?",
        pending.len()
    );
    if !confirm(&prompt, force)? {
        println!("Aborted.");
        return Ok(());
    }

    let report = trash.purge_documents(&pending).await;
    info!(
        days,
        attempted = report.attempted,
        succeeded = report.succeeded,
        failed = report.failed.len(),
        "Document trash cleanup finished"
    );
    print_report("documents", &report);
    Ok(())
}

/// Purge folder trees trashed more than `days` ago.
pub async fn folders(trash: &TrashService, days: u32, force: bool) -> anyhow::Result<()> {
    let pending = trash.pending_folders(days).await?;
    if pending.is_empty() {
        println!("No folders have been in the trash for more than {days} days.");
        return Ok(());
    }

    let prompt = format!(
        "Permanently delete {} folder tree(s) trashed more than {days} days ago, including their documents?",
        pending.len()
    );
    if !confirm(&prompt, force)? {
        println!("Aborted.");
        return Ok(());
    }

    let report = trash.purge_folders(&pending).await;
    info!(
        days,
        attempted = report.attempted,
        succeeded = report.succeeded,
        failed = report.failed.len(),
        "Folder trash cleanup finished"
    );
    print_report("folders", &report);
    Ok(())
}
