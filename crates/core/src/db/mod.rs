//! Cache database integration and project layout definitions.
//!
//! This module wraps a SQLite database storing:
//! - One contents cache document per function
//! - The globals index (name and address reference tables)
//! - A history of rebuild/erase operations
//!
//! It also defines:
//! - `ProjectConfig`: serializable project metadata.
//! - `ProjectLayout`: computed paths for project directories/files.
//! - `ProjectContext`: config, cache and snapshot opened together.

mod cache_db;
mod config;
mod context;
mod layout;
mod models;
mod util;

pub use cache_db::{DbError, DbResult, SqliteCacheStore, CURRENT_SCHEMA_VERSION};
pub use config::{DbConfig, ProjectConfig, SnapshotConfig};
pub use context::ProjectContext;
pub use layout::ProjectLayout;
pub use models::{RebuildRunRecord, RebuildStatus};
pub use util::{load_project_config, load_snapshot, open_cache_store};
