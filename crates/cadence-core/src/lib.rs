//! Cadence Core Library
//!
//! Shared functionality for the Cadence recurring-charge tool:
//! - Database access and migrations
//! - CSV import and merchant normalization
//! - Interval analysis and cadence classification
//! - Calendar anchor detection and next-date prediction
//! - Price-change tracking
//! - The detection pipeline that ties it all together

pub mod analysis;
pub mod config;
pub mod db;
pub mod detect;
pub mod error;
pub mod import;
pub mod models;

pub use analysis::{
    calculate_intervals, classify_average, classify_average_with, consistency_score,
    detect_price_changes, detect_typical_day_of_month, detect_typical_weekday,
    match_billing_pattern, predict_next_date, BillingMatch, FrequencyRange, IntervalAnalysis,
    PriceChange,
};
pub use config::DetectionConfig;
pub use db::{Database, PatternUpsert, TransactionInsertResult};
pub use detect::{DetectionResults, PatternDetector};
pub use error::{Error, Result};
pub use models::{
    Account, Alert, AlertKind, AlertStatus, DetectedPattern, Frequency, NewDetectedPattern,
    NewPredictionFeedback, NewTransaction, Occurrence, OccurrenceSeries, PatternStatus,
    PatternType, PredictionFeedback, PriceChangeEvent, PriceChangeType, Transaction,
};
