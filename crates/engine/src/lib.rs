// In crates/engine/src/lib.rs

//! Orchestration of the two batch jobs: ingesting daily bars from a market
//! data feed, and reconciling derived signals against the stored bars.

pub mod error;
pub mod ingest;
pub mod reconciler;
pub mod report;

pub use error::InstrumentError;
pub use ingest::IngestionRunner;
pub use reconciler::ReconciliationRunner;
pub use report::{InstrumentOutcome, InstrumentReport, RunReport};
