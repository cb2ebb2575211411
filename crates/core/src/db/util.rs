use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::db::{ProjectConfig, ProjectLayout, SqliteCacheStore};
use crate::source::DatabaseSnapshot;

/// Load the project config JSON from disk for a given layout.
pub fn load_project_config(layout: &ProjectLayout) -> Result<ProjectConfig> {
    let config_json = std::fs::read_to_string(&layout.project_config_path).with_context(|| {
        format!("Failed to read project config at {}", layout.project_config_path.display())
    })?;
    let config: ProjectConfig =
        serde_json::from_str(&config_json).context("Failed to parse project config JSON")?;
    Ok(config)
}

/// Resolve the DB path (respecting relative/absolute config) and open the cache store.
pub fn open_cache_store(
    layout: &ProjectLayout,
) -> Result<(ProjectConfig, PathBuf, SqliteCacheStore)> {
    let config = load_project_config(layout)?;
    let db_path = layout.resolve(&config.db.path);
    let store = SqliteCacheStore::open(&db_path)
        .with_context(|| format!("Failed to open cache database at {}", db_path.display()))?;
    Ok((config, db_path, store))
}

/// Load a tag source snapshot, choosing YAML or JSON by file extension.
pub fn load_snapshot(path: &Path) -> Result<DatabaseSnapshot> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot at {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    let snapshot = if matches!(ext, "yaml" | "yml") {
        DatabaseSnapshot::from_yaml_str(&body)
    } else {
        DatabaseSnapshot::from_json_str(&body)
    };
    snapshot.with_context(|| format!("Failed to parse snapshot at {}", path.display()))
}
