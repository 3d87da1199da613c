//! Error types for tlm-board

use thiserror::Error;

/// Validation failures of board transitions
///
/// Returned before any state changes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("At least one tier must remain")]
    LastTier,

    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("Duplicate tier id: {0}")]
    DuplicateTier(String),

    #[error("Invalid tier name: {0}")]
    InvalidName(String),

    #[error("Invalid color (expected #rrggbb): {0}")]
    InvalidColor(String),
}

/// Saved-board decoding errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u64, supported: u32 },

    #[error("Unrecognised snapshot shape: {0}")]
    UnrecognisedShape(String),
}

/// Storage port errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
}

/// Errors talking to the search gateway
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Please enter something to search for")]
    EmptyQuery,

    #[error("Could not reach the search gateway: {0}")]
    Network(String),

    #[error("Search failed ({status}): {message}")]
    Gateway { status: u16, message: String },

    #[error("Unexpected search response: {0}")]
    Parse(String),
}

/// Errors rejecting an upload before anything is read
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unknown bucket: {0}")]
    UnknownBucket(String),

    #[error("No image files selected")]
    NoImages,
}
