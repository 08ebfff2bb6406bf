//! Recurring-pattern detection pipeline
//!
//! One `detect_all` run is the unit of work: expire stale suggestions,
//! rebuild every merchant's occurrence series from stored transactions,
//! analyze each series, and persist what changed. Runs are idempotent;
//! re-running against the same transactions refreshes pending suggestions
//! without duplicating them, price events, or alerts.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::analysis::{
    detect_price_changes, detect_typical_day_of_month_with, detect_typical_weekday_with,
    match_billing_pattern, predict_next_date, IntervalAnalysis,
};
use crate::config::DetectionConfig;
use crate::db::{self, Database, PatternUpsert};
use crate::error::Result;
use crate::models::{
    AlertKind, Frequency, NewDetectedPattern, OccurrenceSeries, PatternType,
};

/// Counters for one detection run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionResults {
    pub series_analyzed: usize,
    pub patterns_created: usize,
    pub patterns_updated: usize,
    pub patterns_expired: usize,
    pub price_events: usize,
    pub alerts_created: usize,
}

/// Runs detection against a database with a given configuration
pub struct PatternDetector<'a> {
    db: &'a Database,
    config: DetectionConfig,
}

impl<'a> PatternDetector<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            config: DetectionConfig::default(),
        }
    }

    pub fn with_config(db: &'a Database, config: DetectionConfig) -> Self {
        Self { db, config }
    }

    /// Run the full detection pipeline
    pub fn detect_all(&self) -> Result<DetectionResults> {
        let mut results = DetectionResults::default();

        results.patterns_expired = self
            .db
            .expire_stale_patterns(self.config.pending_retention_days)?;
        if results.patterns_expired > 0 {
            info!("Expired {} stale pending patterns", results.patterns_expired);
        }

        let series = self.db.occurrence_series()?;
        debug!("Analyzing {} occurrence series", series.len());

        // One transaction per series: its pattern, price events, and alerts
        // commit together, so a failed run never leaves a pattern without
        // the alert that should accompany it.
        let mut conn = self.db.conn()?;
        for s in &series {
            if s.occurrences.len() < self.config.min_occurrences {
                continue;
            }
            results.series_analyzed += 1;
            let tx = conn.transaction()?;
            self.analyze_series(&tx, s, &mut results)?;
            tx.commit()?;
        }

        info!(
            "Detection complete: {} series analyzed, {} patterns created, {} updated, \
             {} price events, {} alerts",
            results.series_analyzed,
            results.patterns_created,
            results.patterns_updated,
            results.price_events,
            results.alerts_created,
        );
        Ok(results)
    }

    fn analyze_series(
        &self,
        conn: &Connection,
        series: &OccurrenceSeries,
        results: &mut DetectionResults,
    ) -> Result<()> {
        let dates = series.dates();
        let Some(analysis) = IntervalAnalysis::of_with(&dates, &self.config.frequency_ranges)
        else {
            return Ok(());
        };

        // The billing-pattern matcher is the promotion gate: a series
        // whose average gap matches no known cadence is not recurring.
        let Some(billing) = match_billing_pattern(analysis.average, analysis.std_dev) else {
            debug!(
                merchant = %series.merchant,
                average = analysis.average,
                "No billing pattern match, skipping"
            );
            return Ok(());
        };

        let pattern_type = if analysis.consistency < self.config.irregular_consistency_threshold {
            // The merchant clearly recurs but the gaps are too noisy to
            // commit to a named cadence.
            PatternType::RecurringMerchant
        } else {
            PatternType::Recurring(billing.frequency)
        };

        let typical_day_of_month =
            detect_typical_day_of_month_with(&dates, self.config.day_of_month_threshold);
        let typical_weekday = detect_typical_weekday_with(&dates, self.config.weekday_threshold);

        let last = *dates.last().expect("series is non-empty");
        let prediction_frequency = match pattern_type {
            PatternType::Recurring(f) => Some(f),
            PatternType::RecurringMerchant => {
                if self.config.predict_irregular {
                    Some(Frequency::Irregular)
                } else {
                    None
                }
            }
        };
        let next_expected = prediction_frequency
            .map(|f| predict_next_date(last, f, typical_day_of_month, typical_weekday));

        let amounts: Vec<f64> = series.amounts().iter().map(|a| a.abs()).collect();
        let amount_min = amounts.iter().cloned().fold(f64::INFINITY, f64::min);
        let amount_max = amounts.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let amount_avg = amounts.iter().sum::<f64>() / amounts.len() as f64;

        let candidate = NewDetectedPattern {
            merchant: series.merchant.clone(),
            account_id: series.account_id,
            pattern_type,
            confidence_score: billing.confidence,
            interval_days: Some(analysis.average),
            amount_min: Some(amount_min),
            amount_max: Some(amount_max),
            amount_avg: Some(amount_avg),
            occurrence_count: series.occurrences.len() as i64,
            typical_day_of_month,
            typical_weekday: typical_weekday.map(|w| w.num_days_from_sunday()),
            first_occurrence: dates.first().copied(),
            last_occurrence: Some(last),
            next_expected,
        };

        let upsert = db::upsert_detected_pattern(conn, &candidate)?;
        let pattern_id = upsert.id();
        match upsert {
            PatternUpsert::Created(_) => {
                results.patterns_created += 1;
                debug!(
                    merchant = %series.merchant,
                    pattern_type = %pattern_type,
                    confidence = billing.confidence,
                    "New pattern detected"
                );
                if billing.confidence >= self.config.alert_confidence_threshold {
                    db::create_alert(
                        conn,
                        AlertKind::NewPattern,
                        Some(pattern_id),
                        None,
                        &format!(
                            "{} looks like a {} charge of about ${:.2}",
                            series.merchant, pattern_type, amount_avg
                        ),
                    )?;
                    results.alerts_created += 1;
                }
            }
            PatternUpsert::Updated(_) => results.patterns_updated += 1,
            PatternUpsert::Unchanged(_) => {}
        }

        self.record_price_changes(conn, series, pattern_id, results)?;
        Ok(())
    }

    /// Append price events newer than anything already stored for the
    /// series, alerting on the large ones.
    fn record_price_changes(
        &self,
        conn: &Connection,
        series: &OccurrenceSeries,
        pattern_id: i64,
        results: &mut DetectionResults,
    ) -> Result<()> {
        let changes = detect_price_changes(&series.occurrences, self.config.price_change_threshold);
        if changes.is_empty() {
            return Ok(());
        }

        let latest_stored =
            db::latest_price_event_date(conn, &series.merchant, series.account_id)?;

        for change in &changes {
            if let Some(latest) = latest_stored {
                if change.effective_date <= latest {
                    continue;
                }
            }

            let event_id = db::insert_price_event(
                conn,
                &series.merchant,
                series.account_id,
                Some(pattern_id),
                change,
            )?;
            results.price_events += 1;
            info!(
                merchant = %series.merchant,
                change = change.change_percentage,
                "Price {} recorded",
                change.change_type
            );

            if change.change_percentage.abs() >= self.config.price_alert_threshold * 100.0 {
                db::create_alert(
                    conn,
                    AlertKind::PriceChange,
                    Some(pattern_id),
                    Some(event_id),
                    &format!(
                        "{} changed from ${:.2} to ${:.2} ({:+.1}%)",
                        series.merchant,
                        change.previous_amount,
                        change.new_amount,
                        change.change_percentage
                    ),
                )?;
                results.alerts_created += 1;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::compute_import_hash;
    use crate::models::{NewTransaction, PatternStatus};
    use chrono::NaiveDate;

    fn insert(db: &Database, account: i64, date: &str, description: &str, amount: f64) {
        let date: NaiveDate = date.parse().unwrap();
        db.insert_transaction(
            account,
            &NewTransaction {
                date,
                description: description.to_string(),
                amount,
                merchant_normalized: Some(crate::import::normalize_merchant(description)),
                import_hash: compute_import_hash(date, description, amount),
                is_transfer: false,
            },
        )
        .unwrap();
    }

    fn seed_monthly(db: &Database, account: i64) {
        for month in 1..=6 {
            insert(db, account, &format!("2024-{:02}-01", month), "NETFLIX.COM", -9.99);
        }
    }

    #[test]
    fn test_detects_monthly_pattern() {
        let db = Database::in_memory().unwrap();
        let account = db.create_account("Checking").unwrap();
        seed_monthly(&db, account);

        let results = PatternDetector::new(&db).detect_all().unwrap();
        assert_eq!(results.patterns_created, 1);

        let patterns = db.list_patterns(Some(PatternStatus::Pending)).unwrap();
        assert_eq!(patterns.len(), 1);
        let p = &patterns[0];
        assert_eq!(p.merchant, "netflix.com");
        assert_eq!(p.pattern_type, PatternType::Recurring(Frequency::Monthly));
        assert!(p.confidence_score > 0.5);
        assert_eq!(p.typical_day_of_month, Some(1));
        assert_eq!(p.occurrence_count, 6);
        assert_eq!(p.next_expected, "2024-07-01".parse().ok());
        assert!((p.amount_avg.unwrap() - 9.99).abs() < 1e-9);
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let db = Database::in_memory().unwrap();
        let account = db.create_account("Checking").unwrap();
        seed_monthly(&db, account);

        let first = PatternDetector::new(&db).detect_all().unwrap();
        assert_eq!(first.patterns_created, 1);

        let second = PatternDetector::new(&db).detect_all().unwrap();
        assert_eq!(second.patterns_created, 0);
        assert_eq!(second.patterns_updated, 1);
        assert_eq!(second.price_events, 0);

        assert_eq!(db.list_patterns(None).unwrap().len(), 1);
        assert_eq!(db.list_alerts(None).unwrap().len(), 1);
    }

    #[test]
    fn test_too_few_occurrences_skipped() {
        let db = Database::in_memory().unwrap();
        let account = db.create_account("Checking").unwrap();
        insert(&db, account, "2024-01-01", "NETFLIX.COM", -9.99);
        insert(&db, account, "2024-02-01", "NETFLIX.COM", -9.99);

        let results = PatternDetector::new(&db).detect_all().unwrap();
        assert_eq!(results.series_analyzed, 0);
        assert!(db.list_patterns(None).unwrap().is_empty());
    }

    #[test]
    fn test_scattered_dates_not_promoted() {
        let db = Database::in_memory().unwrap();
        let account = db.create_account("Checking").unwrap();
        // Average gap ~45 days: outside every billing band
        insert(&db, account, "2024-01-01", "RANDOM SHOP", -20.0);
        insert(&db, account, "2024-02-14", "RANDOM SHOP", -35.0);
        insert(&db, account, "2024-03-30", "RANDOM SHOP", -12.0);
        insert(&db, account, "2024-05-16", "RANDOM SHOP", -28.0);

        let results = PatternDetector::new(&db).detect_all().unwrap();
        assert_eq!(results.series_analyzed, 1);
        assert_eq!(results.patterns_created, 0);
        assert!(db.list_patterns(None).unwrap().is_empty());
    }

    #[test]
    fn test_noisy_cadence_downgraded_to_recurring_merchant() {
        let db = Database::in_memory().unwrap();
        let account = db.create_account("Checking").unwrap();
        // Gaps of 8, 55, 10, 47 days: average 30 (inside the monthly
        // band) but wildly inconsistent
        insert(&db, account, "2024-01-05", "CORNER CAFE", -14.0);
        insert(&db, account, "2024-01-13", "CORNER CAFE", -18.0);
        insert(&db, account, "2024-03-08", "CORNER CAFE", -11.0);
        insert(&db, account, "2024-03-18", "CORNER CAFE", -16.0);
        insert(&db, account, "2024-05-04", "CORNER CAFE", -13.0);

        let results = PatternDetector::new(&db).detect_all().unwrap();
        assert_eq!(results.patterns_created, 1);

        let p = &db.list_patterns(None).unwrap()[0];
        assert_eq!(p.pattern_type, PatternType::RecurringMerchant);
        // Prediction still emitted by default config
        assert!(p.next_expected.is_some());
    }

    #[test]
    fn test_irregular_prediction_suppressed_by_config() {
        let db = Database::in_memory().unwrap();
        let account = db.create_account("Checking").unwrap();
        insert(&db, account, "2024-01-05", "CORNER CAFE", -14.0);
        insert(&db, account, "2024-01-13", "CORNER CAFE", -18.0);
        insert(&db, account, "2024-03-08", "CORNER CAFE", -11.0);
        insert(&db, account, "2024-03-18", "CORNER CAFE", -16.0);
        insert(&db, account, "2024-05-04", "CORNER CAFE", -13.0);

        let config = DetectionConfig {
            predict_irregular: false,
            ..DetectionConfig::default()
        };
        PatternDetector::with_config(&db, config).detect_all().unwrap();

        let p = &db.list_patterns(None).unwrap()[0];
        assert_eq!(p.pattern_type, PatternType::RecurringMerchant);
        assert!(p.next_expected.is_none());
    }

    #[test]
    fn test_price_change_recorded_once_with_alert() {
        let db = Database::in_memory().unwrap();
        let account = db.create_account("Checking").unwrap();
        for month in 1..=4 {
            insert(&db, account, &format!("2024-{:02}-01", month), "NETFLIX.COM", -9.99);
        }
        for month in 5..=6 {
            insert(&db, account, &format!("2024-{:02}-01", month), "NETFLIX.COM", -12.99);
        }

        let first = PatternDetector::new(&db).detect_all().unwrap();
        assert_eq!(first.price_events, 1);

        let events = db.list_price_events(Some("netflix.com")).unwrap();
        assert_eq!(events.len(), 1);
        assert!((events[0].change_percentage - 30.03).abs() < 0.01);
        assert_eq!(events[0].effective_date, "2024-05-01".parse().unwrap());

        // 30% clears the 10% alert threshold
        let price_alerts: Vec<_> = db
            .list_alerts(None)
            .unwrap()
            .into_iter()
            .filter(|a| a.kind == AlertKind::PriceChange)
            .collect();
        assert_eq!(price_alerts.len(), 1);

        // Re-run appends nothing
        let second = PatternDetector::new(&db).detect_all().unwrap();
        assert_eq!(second.price_events, 0);
        assert_eq!(db.list_price_events(Some("netflix.com")).unwrap().len(), 1);
    }

    #[test]
    fn test_small_price_wobble_records_no_event() {
        let db = Database::in_memory().unwrap();
        let account = db.create_account("Checking").unwrap();
        for (month, amount) in [(1, -10.00), (2, -10.20), (3, -10.00), (4, -10.30)] {
            insert(&db, account, &format!("2024-{:02}-01", month), "GYM MEMBERSHIP", amount);
        }

        let results = PatternDetector::new(&db).detect_all().unwrap();
        assert_eq!(results.price_events, 0);
        assert!(db.list_price_events(None).unwrap().is_empty());
    }

    #[test]
    fn test_accepted_pattern_untouched_by_rerun() {
        let db = Database::in_memory().unwrap();
        let account = db.create_account("Checking").unwrap();
        seed_monthly(&db, account);

        PatternDetector::new(&db).detect_all().unwrap();
        let id = db.list_patterns(None).unwrap()[0].id;
        db.accept_pattern(id).unwrap();

        // New month arrives, re-run
        insert(&db, account, "2024-07-01", "NETFLIX.COM", -9.99);
        let results = PatternDetector::new(&db).detect_all().unwrap();
        assert_eq!(results.patterns_created, 0);
        assert_eq!(results.patterns_updated, 0);

        let p = db.get_pattern(id).unwrap().unwrap();
        assert_eq!(p.status, PatternStatus::Accepted);
        assert_eq!(p.occurrence_count, 6); // frozen at acceptance
    }

    #[test]
    fn test_weekly_pattern_with_weekday_anchor() {
        let db = Database::in_memory().unwrap();
        let account = db.create_account("Checking").unwrap();
        // Five consecutive Fridays
        for day in [5, 12, 19, 26] {
            insert(&db, account, &format!("2024-01-{:02}", day), "FARMERS MARKET", -25.0);
        }
        insert(&db, account, "2024-02-02", "FARMERS MARKET", -25.0);

        PatternDetector::new(&db).detect_all().unwrap();
        let p = &db.list_patterns(None).unwrap()[0];
        assert_eq!(p.pattern_type, PatternType::Recurring(Frequency::Weekly));
        assert_eq!(p.typical_weekday, Some(5)); // Friday
        assert_eq!(p.next_expected, "2024-02-09".parse().ok());
    }

    #[test]
    fn test_series_writes_roll_back_together() {
        let db = Database::in_memory().unwrap();
        db.create_account("Checking").unwrap();

        // A pattern and its alert are written on one transaction; if the
        // transaction never commits, neither is visible.
        let mut conn = db.conn().unwrap();
        let tx = conn.transaction().unwrap();
        let upsert = crate::db::upsert_detected_pattern(
            &tx,
            &NewDetectedPattern {
                merchant: "netflix.com".to_string(),
                account_id: 1,
                pattern_type: PatternType::Recurring(Frequency::Monthly),
                confidence_score: 0.9,
                interval_days: Some(30.4),
                amount_min: Some(9.99),
                amount_max: Some(9.99),
                amount_avg: Some(9.99),
                occurrence_count: 6,
                typical_day_of_month: Some(1),
                typical_weekday: None,
                first_occurrence: "2024-01-01".parse().ok(),
                last_occurrence: "2024-06-01".parse().ok(),
                next_expected: "2024-07-01".parse().ok(),
            },
        )
        .unwrap();
        crate::db::create_alert(
            &tx,
            AlertKind::NewPattern,
            Some(upsert.id()),
            None,
            "netflix.com looks like a monthly charge of about $9.99",
        )
        .unwrap();
        drop(tx);
        drop(conn);

        assert!(db.list_patterns(None).unwrap().is_empty());
        assert!(db.list_alerts(None).unwrap().is_empty());
    }

    #[test]
    fn test_series_split_by_account() {
        let db = Database::in_memory().unwrap();
        let checking = db.create_account("Checking").unwrap();
        let credit = db.create_account("Credit").unwrap();
        seed_monthly(&db, checking);
        for month in 1..=4 {
            insert(&db, credit, &format!("2024-{:02}-15", month), "SPOTIFY", -10.99);
        }

        let results = PatternDetector::new(&db).detect_all().unwrap();
        assert_eq!(results.patterns_created, 2);
        assert_eq!(results.series_analyzed, 2);
    }
}
