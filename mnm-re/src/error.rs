//! Error types for mnm-re

use thiserror::Error;

/// Recommendation engine error
#[derive(Debug, Error)]
pub enum EngineError {
    /// Asset file missing, unreadable or inconsistent
    #[error("Asset error: {0}")]
    Asset(String),

    /// File I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A scored candidate refers to a brand the catalog does not hold
    #[error("Unknown brand: {0}")]
    UnknownBrand(String),

    /// Internal consistency failure during scoring
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
