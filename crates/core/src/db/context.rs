use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::cache::Session;
use crate::db::{load_snapshot, open_cache_store, ProjectConfig, ProjectLayout, SqliteCacheStore};
use crate::source::DatabaseSnapshot;

/// Convenience wrapper bundling layout, config, the open cache and the tag source.
#[derive(Debug)]
pub struct ProjectContext {
    pub layout: ProjectLayout,
    pub config: ProjectConfig,
    pub db_path: PathBuf,
    pub store: SqliteCacheStore,
    pub snapshot_path: PathBuf,
    pub snapshot: DatabaseSnapshot,
}

impl ProjectContext {
    /// Load project config, open the cache database and read the snapshot for a given root.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = ProjectLayout::new(root);
        let (config, db_path, store) = open_cache_store(&layout)?;
        let snapshot_path = layout.resolve(&config.snapshot.path);
        let snapshot = load_snapshot(&snapshot_path)?;
        Ok(Self { layout, config, db_path, store, snapshot_path, snapshot })
    }

    /// A session over this project's snapshot and cache, reporting to `out`.
    pub fn session<'a>(&'a mut self, out: &'a mut dyn Write) -> Session<'a> {
        Session::new(&self.snapshot, &mut self.store, out)
    }
}
