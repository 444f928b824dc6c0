// In crates/engine/src/error.rs

use core_types::FetchError;
use thiserror::Error;

/// Why one instrument could not be processed in a run.
#[derive(Error, Debug)]
pub enum InstrumentError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("persistence failed: {0}")]
    Persist(#[from] database::Error),
}
