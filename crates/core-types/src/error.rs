// In crates/core-types/src/error.rs

use thiserror::Error;

/// The error a price collaborator reports when it cannot deliver a series.
///
/// Fetch errors are isolated per instrument: the caller records them and
/// moves on to the next instrument.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("price source unavailable: {0}")]
    Unavailable(String),

    #[error("price source returned malformed data: {0}")]
    Malformed(String),
}

pub type Result<T> = std::result::Result<T, FetchError>;
