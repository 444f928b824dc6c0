// In crates/engine/src/reconciler.rs

use crate::error::InstrumentError;
use crate::report::{InstrumentOutcome, RunReport};
use chrono::{DateTime, Utc};
use core_types::{DateRange, Instrument, Interval, PriceSeriesSource};
use database::{Db, SignalRepository};
use signals::SignalCalculator;
use std::sync::Arc;

/// Recomputes derived signals for a date range and merges them into storage,
/// one instrument at a time.
pub struct ReconciliationRunner {
    db: Db,
    source: Arc<dyn PriceSeriesSource>,
    calculator: Box<dyn SignalCalculator>,
}

impl ReconciliationRunner {
    pub fn new(db: Db, source: Arc<dyn PriceSeriesSource>, calculator: Box<dyn SignalCalculator>) -> Self {
        Self { db, source, calculator }
    }

    /// Runs Fetch, Calculate and Persist for every instrument in order.
    ///
    /// A failing instrument is recorded in the report and the run moves on.
    pub async fn run(&self, instruments: &[Instrument], range: DateRange) -> RunReport {
        let started_at = Utc::now();
        let mut report = RunReport::new(started_at);

        tracing::info!(
            calculator = self.calculator.name(),
            instruments = instruments.len(),
            %range,
            "Starting reconciliation run."
        );

        for instrument in instruments {
            let outcome = match self.reconcile(instrument, range, started_at).await {
                Ok(outcome) => outcome,
                Err(error) => InstrumentOutcome::Failed { error },
            };
            report.record(instrument, outcome);
        }

        tracing::info!(
            processed = report.processed(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Reconciliation run finished."
        );
        report
    }

    async fn reconcile(
        &self,
        instrument: &Instrument,
        range: DateRange,
        processed_at: DateTime<Utc>,
    ) -> Result<InstrumentOutcome, InstrumentError> {
        let bars = self.source.fetch(instrument, range, Interval::Daily).await?;

        let signals = self.calculator.calculate(&bars);
        if signals.is_empty() {
            return Ok(InstrumentOutcome::Skipped {
                reason: format!("no signals from {} bars", bars.len()),
            });
        }

        // Dropping the session on error rolls the whole instrument back.
        let mut session = self.db.begin().await?;
        let summary = SignalRepository::upsert(&mut session, &signals, processed_at).await?;
        session.commit().await.map_err(database::Error::OperationFailed)?;

        Ok(InstrumentOutcome::Processed {
            bars: bars.len(),
            inserted: summary.inserted,
            updated: summary.updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDate};
    use core_types::{FetchError, NewPriceBar, PriceBar};
    use database::{InstrumentRegistry, PriceBarStore};
    use signals::RsiLookahead;
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn range() -> DateRange {
        DateRange::new(date(2023, 1, 1), date(2023, 12, 31))
    }

    /// A zig-zag daily series of `n` bars starting on 2023-01-02.
    fn new_bars(n: usize) -> Vec<NewPriceBar> {
        (0..n)
            .map(|i| {
                let price = if i % 2 == 0 { 20.0 + i as f64 * 0.1 } else { 19.5 + i as f64 * 0.1 };
                NewPriceBar {
                    date: date(2023, 1, 2) + Duration::days(i as i64),
                    open: price,
                    high: price,
                    low: price,
                    close: price,
                    adj_close: price,
                    volume: 100.0,
                }
            })
            .collect()
    }

    async fn seed(db: &Db, code: &str, n: usize) -> Instrument {
        let mut conn = db.acquire().await.unwrap();
        let instrument = InstrumentRegistry::register(&mut conn, code, None, date(2023, 1, 1))
            .await
            .unwrap();
        PriceBarStore::insert_new(&mut conn, instrument.id, &new_bars(n)).await.unwrap();
        instrument
    }

    async fn signal_count(db: &Db) -> i64 {
        let mut conn = db.acquire().await.unwrap();
        SignalRepository::count(&mut conn).await.unwrap()
    }

    fn runner(db: &Db, source: Arc<dyn PriceSeriesSource>) -> ReconciliationRunner {
        ReconciliationRunner::new(db.clone(), source, Box::new(RsiLookahead::default()))
    }

    /// Serves canned results per instrument code.
    struct CannedSource(HashMap<String, core_types::Result<Vec<PriceBar>>>);

    #[async_trait]
    impl PriceSeriesSource for CannedSource {
        async fn fetch(
            &self,
            instrument: &Instrument,
            _range: DateRange,
            _interval: Interval,
        ) -> core_types::Result<Vec<PriceBar>> {
            self.0.get(&instrument.code).cloned().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    /// Reads through to the database except for the codes listed as down.
    struct FlakySource {
        db: Db,
        down: Vec<&'static str>,
    }

    #[async_trait]
    impl PriceSeriesSource for FlakySource {
        async fn fetch(
            &self,
            instrument: &Instrument,
            range: DateRange,
            interval: Interval,
        ) -> core_types::Result<Vec<PriceBar>> {
            if self.down.iter().any(|c| *c == instrument.code) {
                return Err(FetchError::Unavailable("connection reset".into()));
            }
            self.db.fetch(instrument, range, interval).await
        }
    }

    #[tokio::test]
    async fn test_run_processes_stored_series() {
        let db = Db::connect_in_memory().await.unwrap();
        let petr = seed(&db, "PETR4.SA", 30).await;

        let report = runner(&db, Arc::new(db.clone())).run(&[petr], range()).await;

        assert_eq!(report.processed(), 1);
        match report.outcome_of("PETR4.SA") {
            Some(InstrumentOutcome::Processed { bars, inserted, updated }) => {
                assert_eq!((*bars, *inserted, *updated), (30, 8, 0));
            }
            other => panic!("expected Processed, got {:?}", other),
        }
        assert_eq!(signal_count(&db).await, 8);
    }

    #[tokio::test]
    async fn test_rerun_does_not_duplicate() {
        let db = Db::connect_in_memory().await.unwrap();
        let petr = seed(&db, "PETR4.SA", 40).await;
        let runner = runner(&db, Arc::new(db.clone()));

        runner.run(std::slice::from_ref(&petr), range()).await;
        let second = runner.run(&[petr], range()).await;

        match second.outcome_of("PETR4.SA") {
            Some(InstrumentOutcome::Processed { inserted, updated, .. }) => {
                assert_eq!((*inserted, *updated), (0, 18));
            }
            other => panic!("expected Processed, got {:?}", other),
        }
        assert_eq!(signal_count(&db).await, 18);
    }

    #[tokio::test]
    async fn test_fetch_failure_does_not_stop_the_run() {
        let db = Db::connect_in_memory().await.unwrap();
        let first = seed(&db, "AAA", 25).await;
        let broken = seed(&db, "BBB", 25).await;
        let last = seed(&db, "CCC", 25).await;
        let source = FlakySource { db: db.clone(), down: vec!["BBB"] };

        let report = runner(&db, Arc::new(source)).run(&[first, broken, last], range()).await;

        assert_eq!(report.processed(), 2);
        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.outcome_of("BBB"),
            Some(InstrumentOutcome::Failed { error: InstrumentError::Fetch(FetchError::Unavailable(_)) })
        ));
        assert_eq!(signal_count(&db).await, 6);
    }

    #[tokio::test]
    async fn test_persistence_failure_is_reported_as_failed() {
        let db = Db::connect_in_memory().await.unwrap();
        let ghost = seed(&db, "GHOST", 0).await;

        // Bars that were never stored: every signal references a missing bar.
        let bars: Vec<PriceBar> = new_bars(30)
            .into_iter()
            .enumerate()
            .map(|(i, b)| PriceBar {
                id: 50_000 + i as i64,
                instrument_id: ghost.id,
                date: b.date,
                open: b.open,
                high: b.high,
                low: b.low,
                close: b.close,
                adj_close: b.adj_close,
                volume: b.volume,
            })
            .collect();
        let source = CannedSource(HashMap::from([("GHOST".to_string(), Ok(bars))]));

        let report = runner(&db, Arc::new(source)).run(&[ghost], range()).await;

        assert_eq!(report.processed(), 0);
        assert!(matches!(
            report.outcome_of("GHOST"),
            Some(InstrumentOutcome::Failed { error: InstrumentError::Persist(_) })
        ));
        assert_eq!(signal_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_short_series_is_skipped() {
        let db = Db::connect_in_memory().await.unwrap();
        let short = seed(&db, "SHORT", 22).await;

        let report = runner(&db, Arc::new(db.clone())).run(&[short], range()).await;

        assert_eq!(report.skipped(), 1);
        assert!(matches!(report.outcome_of("SHORT"), Some(InstrumentOutcome::Skipped { .. })));
        assert_eq!(signal_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_range_limits_the_series() {
        let db = Db::connect_in_memory().await.unwrap();
        let petr = seed(&db, "PETR4.SA", 40).await;

        // Only the first 25 bars (2023-01-02..=2023-01-26) are in range.
        let narrow = DateRange::new(date(2023, 1, 1), date(2023, 1, 26));
        let report = runner(&db, Arc::new(db.clone())).run(&[petr], narrow).await;

        assert!(matches!(
            report.outcome_of("PETR4.SA"),
            Some(InstrumentOutcome::Processed { bars: 25, inserted: 3, .. })
        ));
    }
}
