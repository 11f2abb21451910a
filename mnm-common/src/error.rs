//! Common error types for MeetNMeal

use thiserror::Error;

/// Common result type for MeetNMeal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared across MeetNMeal crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
