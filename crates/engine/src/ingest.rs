// In crates/engine/src/ingest.rs

use crate::error::InstrumentError;
use crate::report::{InstrumentOutcome, RunReport};
use chrono::{Days, NaiveDate, Utc};
use core_types::{DateRange, Instrument, MarketDataFeed};
use database::{Db, InstrumentRegistry, PriceBarStore};
use std::sync::Arc;

/// Pulls missing daily bars from a market data feed and advances each
/// instrument's `last_integration` watermark.
pub struct IngestionRunner {
    db: Db,
    feed: Arc<dyn MarketDataFeed>,
}

impl IngestionRunner {
    pub fn new(db: Db, feed: Arc<dyn MarketDataFeed>) -> Self {
        Self { db, feed }
    }

    /// Integrates every instrument up to the day before `today`.
    ///
    /// The bars of `[last_integration, yesterday)` are stored and the
    /// watermark set to yesterday in one transaction per instrument.
    pub async fn run(&self, instruments: &[Instrument], today: NaiveDate) -> RunReport {
        let mut report = RunReport::new(Utc::now());
        let yesterday = today - Days::new(1);

        tracing::info!(
            feed = self.feed.name(),
            instruments = instruments.len(),
            %yesterday,
            "Starting ingestion run."
        );

        for instrument in instruments {
            let outcome = match self.ingest(instrument, yesterday).await {
                Ok(outcome) => outcome,
                Err(error) => InstrumentOutcome::Failed { error },
            };
            report.record(instrument, outcome);
        }

        tracing::info!(
            processed = report.processed(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Ingestion run finished."
        );
        report
    }

    async fn ingest(
        &self,
        instrument: &Instrument,
        yesterday: NaiveDate,
    ) -> Result<InstrumentOutcome, InstrumentError> {
        if instrument.last_integration >= yesterday {
            return Ok(InstrumentOutcome::Skipped {
                reason: format!("integrated up to {}", instrument.last_integration),
            });
        }

        let range = DateRange::new(instrument.last_integration, yesterday - Days::new(1));
        let bars = self.feed.daily_bars(&instrument.code, range).await?;

        let mut session = self.db.begin().await?;
        let inserted = PriceBarStore::insert_new(&mut session, instrument.id, &bars).await?;
        InstrumentRegistry::set_last_integration(&mut session, instrument.id, yesterday).await?;
        session.commit().await.map_err(database::Error::OperationFailed)?;

        Ok(InstrumentOutcome::Processed {
            bars: bars.len(),
            inserted: inserted as usize,
            updated: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use core_types::{FetchError, NewPriceBar};
    use std::sync::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Serves one bar per calendar day of the requested range and records
    /// every request.
    #[derive(Default)]
    struct DailyFeed {
        failing: Vec<&'static str>,
        requests: Mutex<Vec<(String, DateRange)>>,
    }

    #[async_trait]
    impl MarketDataFeed for DailyFeed {
        fn name(&self) -> &'static str {
            "daily"
        }

        async fn daily_bars(&self, code: &str, range: DateRange) -> core_types::Result<Vec<NewPriceBar>> {
            self.requests.lock().unwrap().push((code.to_string(), range));
            if self.failing.iter().any(|c| *c == code) {
                return Err(FetchError::Malformed("truncated payload".into()));
            }
            Ok(range
                .start
                .iter_days()
                .take_while(|d| *d <= range.end)
                .map(|date| NewPriceBar {
                    date,
                    open: 10.0,
                    high: 11.0,
                    low: 9.0,
                    close: 10.5,
                    adj_close: 10.5,
                    volume: 1_000.0,
                })
                .collect())
        }
    }

    async fn register(db: &Db, code: &str, since: NaiveDate) -> Instrument {
        let mut conn = db.acquire().await.unwrap();
        InstrumentRegistry::register(&mut conn, code, None, since).await.unwrap()
    }

    async fn reload(db: &Db, code: &str) -> Instrument {
        let mut conn = db.acquire().await.unwrap();
        InstrumentRegistry::find_by_code(&mut conn, code).await.unwrap().unwrap()
    }

    async fn stored_bars(db: &Db, instrument: &Instrument) -> usize {
        let mut conn = db.acquire().await.unwrap();
        let all = DateRange::new(date(2000, 1, 1), date(2100, 1, 1));
        PriceBarStore::in_range(&mut conn, instrument.id, all).await.unwrap().len()
    }

    #[tokio::test]
    async fn test_ingests_up_to_yesterday_and_moves_watermark() {
        let db = Db::connect_in_memory().await.unwrap();
        let vale = register(&db, "VALE3.SA", date(2023, 3, 1)).await;
        let feed = Arc::new(DailyFeed::default());

        let report = IngestionRunner::new(db.clone(), feed.clone())
            .run(&[vale.clone()], date(2023, 3, 11))
            .await;

        assert!(matches!(
            report.outcome_of("VALE3.SA"),
            Some(InstrumentOutcome::Processed { bars: 9, inserted: 9, updated: 0 })
        ));
        assert_eq!(
            feed.requests.lock().unwrap()[0].1,
            DateRange::new(date(2023, 3, 1), date(2023, 3, 9))
        );
        assert_eq!(reload(&db, "VALE3.SA").await.last_integration, date(2023, 3, 10));
        assert_eq!(stored_bars(&db, &vale).await, 9);
    }

    #[tokio::test]
    async fn test_up_to_date_instrument_is_skipped() {
        let db = Db::connect_in_memory().await.unwrap();
        let fresh = register(&db, "ITUB4.SA", date(2023, 3, 10)).await;
        let feed = Arc::new(DailyFeed::default());

        let report = IngestionRunner::new(db.clone(), feed.clone())
            .run(&[fresh], date(2023, 3, 11))
            .await;

        assert_eq!(report.skipped(), 1);
        assert!(feed.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reingesting_stored_days_adds_nothing() {
        let db = Db::connect_in_memory().await.unwrap();
        let petr = register(&db, "PETR4.SA", date(2023, 3, 1)).await;
        let runner = IngestionRunner::new(db.clone(), Arc::new(DailyFeed::default()));

        runner.run(std::slice::from_ref(&petr), date(2023, 3, 11)).await;
        // The stale watermark makes the second run request the same days.
        let again = runner.run(&[petr.clone()], date(2023, 3, 11)).await;

        assert!(matches!(
            again.outcome_of("PETR4.SA"),
            Some(InstrumentOutcome::Processed { bars: 9, inserted: 0, .. })
        ));
        assert_eq!(stored_bars(&db, &petr).await, 9);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_watermark() {
        let db = Db::connect_in_memory().await.unwrap();
        let ok = register(&db, "AAA", date(2023, 3, 1)).await;
        let bad = register(&db, "BBB", date(2023, 3, 1)).await;
        let feed = Arc::new(DailyFeed { failing: vec!["BBB"], ..Default::default() });

        let report = IngestionRunner::new(db.clone(), feed).run(&[ok, bad], date(2023, 3, 11)).await;

        assert_eq!(report.processed(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(reload(&db, "AAA").await.last_integration, date(2023, 3, 10));
        assert_eq!(reload(&db, "BBB").await.last_integration, date(2023, 3, 1));
    }
}
