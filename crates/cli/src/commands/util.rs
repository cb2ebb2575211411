use std::path::Path;

use anyhow::{anyhow, Result};
use tagfix_core::db::ProjectContext;
use tagfix_core::model::{parse_address, Address};

use crate::resolve_root;

/// Load config, cache database and snapshot for the project at `root`.
pub fn open_context(root: &str) -> Result<ProjectContext> {
    let root_path = resolve_root(root)?;
    log::debug!("opening project at {}", root_path.display());
    ProjectContext::from_root(&root_path)
}

/// Parse a `--function`/address argument (`0x` hex or decimal).
pub fn parse_address_arg(text: &str) -> Result<Address> {
    parse_address(text).ok_or_else(|| anyhow!("Invalid address '{}'", text))
}

/// Helper to print whether a file exists.
pub fn print_file_status(label: &str, path: &Path) {
    let exists = path.is_file();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}
