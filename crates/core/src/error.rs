//! Error kinds raised by the tag cache subsystem.

use thiserror::Error;

use crate::db::DbError;
use crate::model::Address;

/// Every failure the core can surface to a caller.
///
/// `FunctionNotFound` and `StoreEntryMissing` are usually recovered locally
/// (`Session::contents`, `Session::verify_content` and the erasers); anything
/// else propagates unmodified to the caller of the top-level entry points.
#[derive(Debug, Error)]
pub enum TagfixError {
    /// The address does not belong to any function.
    #[error("No function found at address {address:#x}")]
    FunctionNotFound { address: Address },

    /// No segment matched the requested selector.
    #[error("Unable to locate segment for {selector}")]
    SegmentNotFound { selector: String },

    /// A delete targeted a key that is not persisted.
    #[error("Cache entry {key} does not exist")]
    StoreEntryMissing { key: String },

    /// A persisted cache entry could not be decoded.
    #[error("Malformed cache entry for {partition}: {reason}")]
    MalformedEntry { partition: String, reason: String },

    /// The tag source snapshot is inconsistent.
    #[error("Invalid database snapshot: {0}")]
    InvalidSnapshot(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for tag cache operations.
pub type TagfixResult<T> = Result<T, TagfixError>;
