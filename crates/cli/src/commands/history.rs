use anyhow::{Context, Result};

use crate::commands::open_context;

/// List recorded cache operations.
pub fn history_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let runs = ctx.store.list_rebuild_runs().context("Failed to list rebuild runs")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    println!("Cache operations:");
    if runs.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for run in runs {
        let hash = run.snapshot_hash.as_deref().map(|h| &h[..h.len().min(12)]).unwrap_or("-");
        let detail = run.detail.as_deref().unwrap_or("");
        println!(
            "- {} [{}] snapshot {} ({} -> {}) {}",
            run.operation,
            run.status.as_str(),
            hash,
            run.started_at,
            run.finished_at,
            detail
        );
    }
    Ok(())
}
