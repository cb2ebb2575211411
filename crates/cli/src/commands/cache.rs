use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::Utc;
use tagfix_core::db::{ProjectContext, RebuildRunRecord, RebuildStatus};
use tagfix_core::model::Address;

use crate::commands::open_context;
use crate::try_snapshot_fingerprint;

/// A cache mutation requested from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOperation {
    Everything,
    All,
    Contents(Address),
    Globals,
    CustomNames,
    ExtraComments,
    Erase,
}

impl CacheOperation {
    pub fn name(&self) -> &'static str {
        match self {
            CacheOperation::Everything => "everything",
            CacheOperation::All => "all",
            CacheOperation::Contents(_) => "contents",
            CacheOperation::Globals => "globals",
            CacheOperation::CustomNames => "customnames",
            CacheOperation::ExtraComments => "extracomments",
            CacheOperation::Erase => "erase",
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            CacheOperation::Contents(ea) => Some(format!("function {ea:#x}")),
            _ => None,
        }
    }
}

/// Run one cache operation against an open project and return a summary line.
pub fn run_cache_operation(
    ctx: &mut ProjectContext,
    operation: CacheOperation,
    out: &mut dyn Write,
) -> Result<String> {
    let mut session = ctx.session(out);
    let summary = match operation {
        CacheOperation::Everything => {
            session.everything()?;
            "Rebuilt the globals index and every function cache".to_string()
        }
        CacheOperation::All => {
            session.all()?;
            "Updated the globals index and every function cache".to_string()
        }
        CacheOperation::Contents(ea) => {
            let counts = session.contents(ea)?;
            format!(
                "Counted {} address(es) and {} tag name(s) for {:#x}",
                counts.addresses.len(),
                counts.names.len(),
                ea
            )
        }
        CacheOperation::Globals => {
            let counts = session.globals()?;
            format!(
                "Indexed {} global address(es) and {} tag name(s)",
                counts.addresses.len(),
                counts.names.len()
            )
        }
        CacheOperation::CustomNames => {
            let added = session.customnames()?;
            format!("Added {added} custom name reference(s)")
        }
        CacheOperation::ExtraComments => {
            let added = session.extracomments()?;
            format!("Added {added} extra comment reference(s)")
        }
        CacheOperation::Erase => {
            let removed = session.erase()?;
            format!("Removed {removed} cache entr{}", if removed == 1 { "y" } else { "ies" })
        }
    };
    Ok(summary)
}

/// Run a cache operation for the project at `root` and record it in the history.
pub fn cache_command(root: &str, operation: CacheOperation) -> Result<()> {
    let mut ctx = open_context(root)?;
    let snapshot_hash = try_snapshot_fingerprint(&ctx.snapshot_path);

    let started_at = Utc::now().to_rfc3339();
    let mut stderr = io::stderr();
    let outcome = run_cache_operation(&mut ctx, operation, &mut stderr);
    let finished_at = Utc::now().to_rfc3339();

    let (status, detail) = match &outcome {
        Ok(_) => (RebuildStatus::Succeeded, operation.detail()),
        Err(err) => (RebuildStatus::Failed, Some(format!("{err:#}"))),
    };
    let record = RebuildRunRecord {
        operation: operation.name().to_string(),
        snapshot_hash,
        status,
        detail,
        started_at,
        finished_at,
    };
    let id = ctx.store.insert_rebuild_run(&record).context("Failed to record rebuild run")?;
    log::info!("recorded {} run #{id} ({})", record.operation, record.status.as_str());

    let summary = outcome.with_context(|| format!("'{}' failed", operation.name()))?;
    println!("{summary}");
    Ok(())
}
