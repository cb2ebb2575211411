use std::fs;

use anyhow::{Context, Result};
use tagfix_core::db::{ProjectConfig, ProjectLayout, SqliteCacheStore};
use tagfix_core::source::DatabaseSnapshot;

use crate::{default_project_name, resolve_root};

/// Initialize a new project at `root`.
///
/// This will:
/// - Create the `.tagfix` metadata directory and `project.json`.
/// - Create the cache database.
/// - Write an empty snapshot if none exists at the configured path.
pub fn init_project_command(
    root: &str,
    name: Option<String>,
    snapshot: Option<String>,
) -> Result<()> {
    let root_path = resolve_root(root)?;
    let layout = ProjectLayout::new(&root_path);

    let project_name = match name {
        Some(n) => n,
        None => default_project_name(&root_path),
    };

    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;

    let snapshot_rel = snapshot.unwrap_or_else(|| layout.snapshot_path_relative_string());
    let config =
        ProjectConfig::new(&project_name, layout.db_path_relative_string(), snapshot_rel.clone());

    let json = serde_json::to_string_pretty(&config)?;
    fs::write(&layout.project_config_path, json).with_context(|| {
        format!("Failed to write project config: {}", layout.project_config_path.display())
    })?;

    // Create the cache database immediately so follow-on commands can rely on it.
    SqliteCacheStore::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize cache database at {}", layout.db_path.display())
    })?;

    let snapshot_path = layout.resolve(&snapshot_rel);
    if !snapshot_path.exists() {
        let empty = serde_json::to_string_pretty(&DatabaseSnapshot::default())?;
        fs::write(&snapshot_path, empty).with_context(|| {
            format!("Failed to write empty snapshot: {}", snapshot_path.display())
        })?;
    }

    println!("Initialized tagfix project:");
    println!("  Name: {}", project_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.project_config_path.display());
    println!("  DB path (relative): {}", config.db.path);
    println!("  Snapshot: {}", snapshot_path.display());

    Ok(())
}
