use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Outcome of a recorded cache operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RebuildStatus {
    Succeeded,
    Failed,
}

impl RebuildStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RebuildStatus::Succeeded => "succeeded",
            RebuildStatus::Failed => "failed",
        }
    }
}

impl FromStr for RebuildStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "succeeded" => Ok(RebuildStatus::Succeeded),
            "failed" => Ok(RebuildStatus::Failed),
            other => Err(format!("Invalid rebuild status '{other}'")),
        }
    }
}

/// Bookkeeping row for one mutation of the cache (rebuild, erase, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RebuildRunRecord {
    /// Operation name, e.g. `everything` or `contents`.
    pub operation: String,
    /// SHA-256 of the tag source snapshot the operation read.
    pub snapshot_hash: Option<String>,
    pub status: RebuildStatus,
    /// Free-form detail such as the target function or the failure message.
    pub detail: Option<String>,
    pub started_at: String,
    pub finished_at: String,
}
