//! Interval calculation and consistency scoring
//!
//! Intervals are the day gaps between consecutive occurrences of one
//! grouping key. The consistency score reduces those gaps to a single
//! 0..1 "how regular is this" number via the coefficient of variation.

use chrono::NaiveDate;

use crate::models::Frequency;

use super::frequency::{classify_average_with, FrequencyRange, FREQUENCY_RANGES};

/// Day gaps between consecutive dates, computed over an ascending sort.
///
/// The input does not need to be pre-sorted; a sorted copy is taken.
/// Fewer than 2 dates means no intervals exist, which callers must treat
/// as "insufficient data", not "zero variance".
pub fn calculate_intervals(dates: &[NaiveDate]) -> Vec<f64> {
    if dates.len() < 2 {
        return Vec::new();
    }

    let mut sorted = dates.to_vec();
    sorted.sort();

    sorted
        .windows(2)
        .map(|w| (w[1] - w[0]).num_days() as f64)
        .collect()
}

/// Score how evenly spaced a series of intervals is, 0..1.
///
/// One interval scores exactly 1.0: a single gap has no contradicting
/// evidence yet, so this is a deliberate optimistic default rather than
/// statistical proof. An average of 0 (same-day data) scores 0.0.
/// Otherwise the score is `max(0, 1 - stddev/average)`, so a coefficient
/// of variation >= 1 always yields 0. This is a bounded heuristic, not a
/// confidence interval.
pub fn consistency_score(intervals: &[f64]) -> f64 {
    if intervals.is_empty() {
        return 0.0;
    }
    if intervals.len() == 1 {
        return 1.0;
    }

    let average = mean(intervals);
    if average == 0.0 {
        return 0.0;
    }

    let cv = std_dev(intervals, average) / average;
    (1.0 - cv).max(0.0)
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation around a known mean
pub(crate) fn std_dev(values: &[f64], average: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance =
        values.iter().map(|v| (v - average).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Derived interval statistics for one grouping key. Computed fresh every
/// run; never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalAnalysis {
    pub intervals: Vec<f64>,
    pub average: f64,
    pub std_dev: f64,
    /// 0..1 regularity heuristic
    pub consistency: f64,
    /// Always a named bucket; the pipeline may downgrade to irregular
    /// based on consistency
    pub frequency: Frequency,
}

impl IntervalAnalysis {
    /// Analyze a date list against the default frequency ranges. Returns
    /// None when fewer than 2 dates exist.
    pub fn of(dates: &[NaiveDate]) -> Option<Self> {
        Self::of_with(dates, FREQUENCY_RANGES)
    }

    /// Analyze with a caller-supplied frequency range table
    pub fn of_with(dates: &[NaiveDate], ranges: &[FrequencyRange]) -> Option<Self> {
        let intervals = calculate_intervals(dates);
        if intervals.is_empty() {
            return None;
        }

        let average = mean(&intervals);
        let std_dev = std_dev(&intervals, average);
        let consistency = consistency_score(&intervals);
        let frequency = classify_average_with(average, ranges);

        Some(Self {
            intervals,
            average,
            std_dev,
            consistency,
            frequency,
        })
    }
}
