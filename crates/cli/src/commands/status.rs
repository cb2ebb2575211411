use anyhow::Result;
use serde::Serialize;
use tagfix_core::db::CURRENT_SCHEMA_VERSION;
use tagfix_core::source::TagSource;
use tagfix_core::store::{CacheStore, Partition};

use crate::commands::{open_context, print_file_status};
use crate::try_snapshot_fingerprint;

#[derive(Debug, Serialize)]
pub struct ProjectStatusSnapshot {
    pub name: String,
    pub root: String,
    pub config_file: String,
    pub db_path: String,
    pub schema_version: i32,
    pub snapshot_path: String,
    pub snapshot_sha256: Option<String>,
    pub functions: usize,
    pub defined_addresses: usize,
    pub contents_caches: usize,
    pub global_names: usize,
    pub global_addresses: usize,
    pub recorded_operations: usize,
}

/// Summarize the project, its snapshot and the persisted cache.
pub fn status_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let schema_version: i32 =
        ctx.store.connection().query_row("PRAGMA user_version;", [], |row| row.get(0))?;

    let globals = ctx.store.read(Partition::Globals)?;
    let (global_names, global_addresses) = match globals {
        Some(entry) => {
            let counts = entry.counts()?;
            (counts.names.len(), counts.addresses.len())
        }
        None => (0, 0),
    };

    let status = ProjectStatusSnapshot {
        name: ctx.config.name.clone(),
        root: ctx.layout.root.display().to_string(),
        config_file: ctx.layout.project_config_path.display().to_string(),
        db_path: ctx.db_path.display().to_string(),
        schema_version,
        snapshot_path: ctx.snapshot_path.display().to_string(),
        snapshot_sha256: try_snapshot_fingerprint(&ctx.snapshot_path),
        functions: ctx.snapshot.functions().len(),
        defined_addresses: ctx.snapshot.heads.len(),
        contents_caches: ctx.store.contents_keys()?.len(),
        global_names,
        global_addresses,
        recorded_operations: ctx.store.list_rebuild_runs()?.len(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("tagfix Project Status");
    println!("=====================");
    println!("Name: {}", status.name);
    println!("Root: {}", status.root);
    println!("Schema version: {} (latest {})", status.schema_version, CURRENT_SCHEMA_VERSION);
    println!();
    println!("Files:");
    print_file_status("Config", &ctx.layout.project_config_path);
    print_file_status("Cache DB", &ctx.db_path);
    print_file_status("Snapshot", &ctx.snapshot_path);
    println!();
    println!(
        "Snapshot: {} function(s), {} defined address(es)",
        status.functions, status.defined_addresses
    );
    println!("Snapshot SHA-256: {}", status.snapshot_sha256.as_deref().unwrap_or("-"));
    println!(
        "Cache: {} function cache(s), {} global tag name(s), {} global address(es)",
        status.contents_caches, status.global_names, status.global_addresses
    );
    println!("Recorded operations: {}", status.recorded_operations);

    Ok(())
}
