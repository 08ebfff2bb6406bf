//! Recurring-charge analysis primitives
//!
//! Pure, side-effect-free functions over one grouping key's charge history:
//! - `intervals` - day gaps between occurrences and the consistency score
//! - `frequency` - cadence classification and the billing-pattern matcher
//! - `anchor` - dominant day-of-month / weekday detection
//! - `predict` - next-occurrence date prediction
//! - `price` - amount-change detection over a chronological series
//!
//! The detection pipeline in `crate::detect` composes these; every function
//! here is safe to call in parallel across independent grouping keys.

mod anchor;
mod frequency;
mod intervals;
mod predict;
mod price;

pub use anchor::{
    detect_typical_day_of_month, detect_typical_day_of_month_with, detect_typical_weekday,
    detect_typical_weekday_with, DAY_OF_MONTH_CLUSTER_TOLERANCE, DAY_OF_MONTH_THRESHOLD,
    WEEKDAY_THRESHOLD,
};
pub use frequency::{
    classify_average, classify_average_with, match_billing_pattern, BillingMatch, BillingPattern,
    FrequencyRange, BILLING_PATTERNS, FREQUENCY_RANGES,
};
pub use intervals::{calculate_intervals, consistency_score, IntervalAnalysis};
pub use predict::predict_next_date;
pub use price::{detect_price_changes, PriceChange};
