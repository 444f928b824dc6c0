// In crates/engine/src/report.rs

use crate::error::InstrumentError;
use chrono::{DateTime, Utc};
use core_types::Instrument;
use serde::{Serialize, Serializer};
use std::fmt;

/// What happened to one instrument during a run.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstrumentOutcome {
    /// `bars` were read; `inserted` and `updated` count the rows written.
    Processed {
        bars: usize,
        inserted: usize,
        updated: usize,
    },
    /// Nothing was written.
    Skipped { reason: String },
    /// The instrument's transaction was rolled back.
    Failed {
        #[serde(serialize_with = "as_display")]
        error: InstrumentError,
    },
}

impl fmt::Display for InstrumentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processed { bars, inserted, updated } => {
                write!(f, "processed {bars} bars ({inserted} inserted, {updated} updated)")
            }
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

fn as_display<T: fmt::Display, S: Serializer>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[derive(Debug, Serialize)]
pub struct InstrumentReport {
    pub instrument_id: i64,
    pub code: String,
    #[serde(flatten)]
    pub outcome: InstrumentOutcome,
}

/// The per-instrument summary of a reconciliation or ingestion run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub instruments: Vec<InstrumentReport>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            instruments: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, instrument: &Instrument, outcome: InstrumentOutcome) {
        match &outcome {
            InstrumentOutcome::Failed { error } => {
                tracing::error!(instrument = %instrument.code, %error, "Instrument failed.");
            }
            other => tracing::info!(instrument = %instrument.code, outcome = %other, "Instrument done."),
        }
        self.instruments.push(InstrumentReport {
            instrument_id: instrument.id,
            code: instrument.code.clone(),
            outcome,
        });
    }

    pub fn processed(&self) -> usize {
        self.count(|o| matches!(o, InstrumentOutcome::Processed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, InstrumentOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, InstrumentOutcome::Failed { .. }))
    }

    /// The instruments that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &InstrumentError)> {
        self.instruments.iter().filter_map(|r| match &r.outcome {
            InstrumentOutcome::Failed { error } => Some((r.code.as_str(), error)),
            _ => None,
        })
    }

    pub fn outcome_of(&self, code: &str) -> Option<&InstrumentOutcome> {
        self.instruments.iter().find(|r| r.code == code).map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&InstrumentOutcome) -> bool) -> usize {
        self.instruments.iter().filter(|r| pred(&r.outcome)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use core_types::FetchError;

    fn instrument(id: i64, code: &str) -> Instrument {
        Instrument {
            id,
            code: code.to_string(),
            description: None,
            last_integration: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        }
    }

    fn report() -> RunReport {
        let mut report = RunReport::new(Utc::now());
        report.record(
            &instrument(1, "AAA"),
            InstrumentOutcome::Processed { bars: 30, inserted: 8, updated: 0 },
        );
        report.record(
            &instrument(2, "BBB"),
            InstrumentOutcome::Skipped { reason: "only 5 bars".into() },
        );
        report.record(
            &instrument(3, "CCC"),
            InstrumentOutcome::Failed {
                error: FetchError::Unavailable("timeout".into()).into(),
            },
        );
        report
    }

    #[test]
    fn test_counts_each_outcome() {
        let report = report();
        assert_eq!(report.processed(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.failed(), 1);

        let failures: Vec<&str> = report.failures().map(|(code, _)| code).collect();
        assert_eq!(failures, vec!["CCC"]);
    }

    #[test]
    fn test_report_serializes_with_status_tags() {
        let json = serde_json::to_value(report()).unwrap();
        let rows = json["instruments"].as_array().unwrap();

        assert_eq!(rows[0]["status"], "processed");
        assert_eq!(rows[0]["inserted"], 8);
        assert_eq!(rows[1]["status"], "skipped");
        assert_eq!(rows[2]["status"], "failed");
        assert_eq!(rows[2]["code"], "CCC");
        assert_eq!(rows[2]["error"], "fetch failed: price source unavailable: timeout");
    }
}
