//! Error types for grid files

use thiserror::Error;

/// Result type for feasgrid operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from loading and saving grids
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Grid file is not valid JSON in the expected shape
    #[cfg(feature = "json")]
    #[error("Invalid grid file: {0}")]
    Json(#[from] serde_json::Error),
}
