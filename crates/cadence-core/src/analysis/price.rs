//! Price-change detection over an occurrence history
//!
//! Works on absolute amounts so the sign convention of the transaction
//! store (charges stored negative) never leaks into percentage math.

use chrono::NaiveDate;

use crate::models::{Occurrence, PriceChangeType};

/// A flagged step between two consecutive occurrences
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChange {
    pub previous_amount: f64,
    pub new_amount: f64,
    pub effective_date: NaiveDate,
    pub change_type: PriceChangeType,
    /// Signed percentage, `(new - previous) / previous * 100`
    pub change_percentage: f64,
}

/// Walk consecutive occurrence pairs and flag every step whose relative
/// change exceeds `threshold` (a fraction, e.g. 0.05 for 5%).
///
/// Occurrences are compared in the order given; callers pass them date
/// ascending. A previous amount of zero cannot produce a relative change
/// and is skipped.
pub fn detect_price_changes(occurrences: &[Occurrence], threshold: f64) -> Vec<PriceChange> {
    let mut changes = Vec::new();
    for pair in occurrences.windows(2) {
        let previous = pair[0].amount.abs();
        let new = pair[1].amount.abs();
        if previous == 0.0 {
            continue;
        }
        let relative = (new - previous) / previous;
        if relative.abs() > threshold {
            changes.push(PriceChange {
                previous_amount: previous,
                new_amount: new,
                effective_date: pair[1].date,
                change_type: if relative > 0.0 {
                    PriceChangeType::Increase
                } else {
                    PriceChangeType::Decrease
                },
                change_percentage: relative * 100.0,
            });
        }
    }
    changes
}
