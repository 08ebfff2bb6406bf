//! Cadence classification
//!
//! Two independent classifiers with different contracts:
//! - `classify_average` is total: every finite non-negative gap maps to a
//!   named bucket, never `Irregular`.
//! - `match_billing_pattern` is the gate for suggestion emission: it can
//!   legitimately report no match, and produces the confidence score a
//!   promoted pattern carries. "Classified" is not the same as "confident
//!   enough to suggest to a user".

use serde::Deserialize;

use crate::models::Frequency;

/// One named day-gap range for the classifier
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FrequencyRange {
    pub frequency: Frequency,
    pub min_days: f64,
    pub max_days: f64,
}

impl FrequencyRange {
    const fn new(frequency: Frequency, min_days: f64, max_days: f64) -> Self {
        Self { frequency, min_days, max_days }
    }

    fn midpoint(&self) -> f64 {
        (self.min_days + self.max_days) / 2.0
    }
}

/// Default day-gap ranges, in ascending order. The order is load-bearing:
/// the closest-midpoint fallback walks the list front to back, so ties
/// resolve to the shorter cadence deterministically. The bounds are policy
/// and can be overridden through `DetectionConfig::frequency_ranges`.
pub const FREQUENCY_RANGES: &[FrequencyRange] = &[
    FrequencyRange::new(Frequency::Daily, 0.5, 1.5),
    FrequencyRange::new(Frequency::Weekly, 6.0, 8.0),
    FrequencyRange::new(Frequency::Biweekly, 13.0, 15.0),
    FrequencyRange::new(Frequency::Monthly, 27.0, 32.0),
    FrequencyRange::new(Frequency::Quarterly, 85.0, 95.0),
    FrequencyRange::new(Frequency::SemiAnnual, 175.0, 190.0),
    FrequencyRange::new(Frequency::Annual, 360.0, 370.0),
];

/// `classify_average_with` against the default ranges
pub fn classify_average(average: f64) -> Frequency {
    classify_average_with(average, FREQUENCY_RANGES)
}

/// Map an average day-gap to a named frequency bucket using the given
/// ascending range table.
///
/// Pure and total over finite non-negative inputs:
/// 1. first exact range match wins;
/// 2. below the first lower bound clamps to the first entry, above the last
///    upper bound clamps to the last;
/// 3. gaps that fall between named ranges go to the range with the closest
///    midpoint, earlier entry winning ties.
pub fn classify_average_with(average: f64, ranges: &[FrequencyRange]) -> Frequency {
    // An empty table would leave nothing to classify against; keep the
    // function total by falling back to the defaults.
    let ranges = if ranges.is_empty() { FREQUENCY_RANGES } else { ranges };

    for range in ranges {
        if average >= range.min_days && average <= range.max_days {
            return range.frequency;
        }
    }

    let first = ranges[0];
    if average < first.min_days {
        return first.frequency;
    }
    let last = ranges[ranges.len() - 1];
    if average > last.max_days {
        return last.frequency;
    }

    // Between named ranges: nearest midpoint, strict comparison so the
    // earlier (shorter-cadence) entry keeps ties.
    let mut best = first.frequency;
    let mut best_distance = f64::INFINITY;
    for range in ranges {
        let distance = (average - range.midpoint()).abs();
        if distance < best_distance {
            best_distance = distance;
            best = range.frequency;
        }
    }
    best
}

/// One row of the billing-pattern table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillingPattern {
    pub target_days: f64,
    pub tolerance: f64,
    pub frequency: Frequency,
}

/// Known billing cadences with the gap tolerance each allows. Ordered;
/// the matcher returns the first band that covers the average.
pub const BILLING_PATTERNS: &[BillingPattern] = &[
    BillingPattern { target_days: 1.0, tolerance: 0.5, frequency: Frequency::Daily },
    BillingPattern { target_days: 7.0, tolerance: 2.0, frequency: Frequency::Weekly },
    BillingPattern { target_days: 14.0, tolerance: 2.0, frequency: Frequency::Biweekly },
    BillingPattern { target_days: 30.0, tolerance: 5.0, frequency: Frequency::Monthly },
    BillingPattern { target_days: 91.0, tolerance: 10.0, frequency: Frequency::Quarterly },
    BillingPattern { target_days: 182.0, tolerance: 15.0, frequency: Frequency::SemiAnnual },
    BillingPattern { target_days: 365.0, tolerance: 30.0, frequency: Frequency::Annual },
];

/// A successful billing-pattern match
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BillingMatch {
    pub frequency: Frequency,
    /// `max(0, 1 - stddev/tolerance)`: how tightly the observed gaps fit
    /// inside the matched band
    pub confidence: f64,
}

/// Match an (average, stddev) pair against the billing-pattern table.
///
/// Returns the first band whose `|average - target| <= tolerance`, or None
/// when no band covers the average (confidence 0 by construction).
pub fn match_billing_pattern(average: f64, std_dev: f64) -> Option<BillingMatch> {
    BILLING_PATTERNS
        .iter()
        .find(|p| (average - p.target_days).abs() <= p.tolerance)
        .map(|p| BillingMatch {
            frequency: p.frequency,
            confidence: (1.0 - std_dev / p.tolerance).max(0.0),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_range_matches() {
        assert_eq!(classify_average(1.0), Frequency::Daily);
        assert_eq!(classify_average(7.0), Frequency::Weekly);
        assert_eq!(classify_average(14.0), Frequency::Biweekly);
        assert_eq!(classify_average(30.0), Frequency::Monthly);
        assert_eq!(classify_average(90.0), Frequency::Quarterly);
        assert_eq!(classify_average(182.0), Frequency::SemiAnnual);
        assert_eq!(classify_average(365.0), Frequency::Annual);
    }

    #[test]
    fn test_clamps_at_extremes() {
        assert_eq!(classify_average(0.3), Frequency::Daily);
        assert_eq!(classify_average(0.0), Frequency::Daily);
        assert_eq!(classify_average(400.0), Frequency::Annual);
        assert_eq!(classify_average(10_000.0), Frequency::Annual);
    }

    #[test]
    fn test_gap_between_ranges_goes_to_nearest_midpoint() {
        // 4.0 sits between daily [0.5,1.5] (mid 1.0) and weekly [6,8] (mid 7.0)
        assert_eq!(classify_average(4.0), Frequency::Daily);
        assert_eq!(classify_average(5.0), Frequency::Weekly);
        // Between biweekly (mid 14) and monthly (mid 29.5)
        assert_eq!(classify_average(20.0), Frequency::Biweekly);
        assert_eq!(classify_average(25.0), Frequency::Monthly);
        // Between monthly (mid 29.5) and quarterly (mid 90)
        assert_eq!(classify_average(55.0), Frequency::Monthly);
        assert_eq!(classify_average(65.0), Frequency::Quarterly);
    }

    #[test]
    fn test_midpoint_tie_goes_to_shorter_cadence() {
        // Exactly equidistant between daily (1.0) and weekly (7.0) midpoints
        assert_eq!(classify_average(4.0), Frequency::Daily);
    }

    #[test]
    fn test_classifier_is_deterministic() {
        for avg in [0.0, 0.3, 4.0, 7.0, 20.0, 45.0, 120.0, 400.0] {
            assert_eq!(classify_average(avg), classify_average(avg));
        }
    }

    #[test]
    fn test_classifier_honors_custom_ranges() {
        let ranges = [
            FrequencyRange::new(Frequency::Weekly, 6.0, 8.0),
            FrequencyRange::new(Frequency::Monthly, 25.0, 40.0),
        ];
        // Inside the widened monthly band
        assert_eq!(classify_average_with(38.0, &ranges), Frequency::Monthly);
        // 60 days: default table sends this to quarterly by midpoint, the
        // custom table has no quarterly entry
        assert_eq!(classify_average(60.0), Frequency::Quarterly);
        assert_eq!(classify_average_with(60.0, &ranges), Frequency::Monthly);
        // Clamping uses the table's own first/last entries
        assert_eq!(classify_average_with(3.0, &ranges), Frequency::Weekly);
        assert_eq!(classify_average_with(500.0, &ranges), Frequency::Monthly);
    }

    #[test]
    fn test_classifier_empty_table_falls_back_to_defaults() {
        assert_eq!(classify_average_with(30.0, &[]), Frequency::Monthly);
    }

    #[test]
    fn test_classifier_never_returns_irregular() {
        let mut avg = 0.0;
        while avg < 500.0 {
            assert_ne!(classify_average(avg), Frequency::Irregular);
            avg += 0.25;
        }
    }

    #[test]
    fn test_billing_match_monthly() {
        let m = match_billing_pattern(30.0, 2.0).unwrap();
        assert_eq!(m.frequency, Frequency::Monthly);
        assert!(m.confidence > 0.5);
    }

    #[test]
    fn test_billing_match_none_between_bands() {
        // 45 days falls outside every tolerance band
        assert!(match_billing_pattern(45.0, 20.0).is_none());
    }

    #[test]
    fn test_billing_match_confidence_clamps_at_zero() {
        // stddev far beyond the tolerance still matches the band, but with
        // zero confidence
        let m = match_billing_pattern(30.0, 50.0).unwrap();
        assert_eq!(m.confidence, 0.0);
    }

    #[test]
    fn test_billing_match_perfect_fit() {
        let m = match_billing_pattern(7.0, 0.0).unwrap();
        assert_eq!(m.frequency, Frequency::Weekly);
        assert!((m.confidence - 1.0).abs() < 1e-9);
    }
}
