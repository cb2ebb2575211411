use std::path::{Path, PathBuf};

/// Logical layout of a project on disk.
///
/// This is derived from a chosen root path. It does *not* perform any IO itself.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// Root directory of the project.
    pub root: PathBuf,
    /// Directory for internal metadata (.tagfix).
    pub meta_dir: PathBuf,
    /// Path to the project config file (JSON).
    pub project_config_path: PathBuf,
    /// Default path of the cache database.
    pub db_path: PathBuf,
    /// Default path of the tag source snapshot.
    pub snapshot_path: PathBuf,
}

impl ProjectLayout {
    /// Compute the default layout for a project rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let meta_dir = root.join(".tagfix");
        let project_config_path = meta_dir.join("project.json");
        let db_path = meta_dir.join("cache.db");
        let snapshot_path = root.join("database.json");

        Self { root, meta_dir, project_config_path, db_path, snapshot_path }
    }

    /// Database path relative to `root`, for storing in `ProjectConfig`.
    pub fn db_path_relative_string(&self) -> String {
        self.relative_string(&self.db_path)
    }

    /// Snapshot path relative to `root`, for storing in `ProjectConfig`.
    pub fn snapshot_path_relative_string(&self) -> String {
        self.relative_string(&self.snapshot_path)
    }

    /// Resolve a configured path against `root` unless it is absolute.
    pub fn resolve(&self, configured: &str) -> PathBuf {
        let path = Path::new(configured);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn relative_string(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => path.to_string_lossy().to_string(),
        }
    }
}
