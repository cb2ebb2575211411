use serde::{Deserialize, Serialize};

/// Location of the cache database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the cache database file (typically relative to project root).
    pub path: String,
}

impl DbConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Location of the tag source snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Path to a JSON or YAML snapshot (typically relative to project root).
    pub path: String,
}

/// Serializable configuration describing a tagfix project.
///
/// This lives at `.tagfix/project.json` in the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Human-friendly project name.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Schema/config version. This is about the config format, not the database.
    pub config_version: String,
    /// Cache database configuration.
    pub db: DbConfig,
    /// Tag source snapshot configuration.
    pub snapshot: SnapshotConfig,
}

impl ProjectConfig {
    /// Create a new project configuration using the given name, db path and snapshot path.
    pub fn new(
        name: impl Into<String>,
        db_path: impl Into<String>,
        snapshot_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db: DbConfig::new(db_path),
            snapshot: SnapshotConfig { path: snapshot_path.into() },
        }
    }
}
