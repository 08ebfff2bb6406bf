//! Detection policy configuration
//!
//! Every tunable threshold the engine uses lives here, so policy can be
//! adjusted through a TOML file instead of a rebuild. Defaults match the
//! values the detection pipeline was calibrated with.

use std::path::Path;

use serde::Deserialize;

use crate::analysis::{FrequencyRange, FREQUENCY_RANGES};
use crate::error::{Error, Result};

/// Policy constants for the detection pipeline
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum occurrences required before a grouping key is analyzed
    pub min_occurrences: usize,

    /// Relative amount change that gets recorded as a PriceChangeEvent
    /// (e.g., 0.05 = 5%)
    pub price_change_threshold: f64,

    /// Relative amount change that additionally raises an alert
    pub price_alert_threshold: f64,

    /// Consistency score below which a classified cadence is downgraded
    /// to irregular before emission
    pub irregular_consistency_threshold: f64,

    /// Billing-match confidence at or above which a new pattern raises an alert
    pub alert_confidence_threshold: f64,

    /// Share of occurrences the dominant day-of-month (or its ±2-day cluster)
    /// must cover to be accepted as an anchor
    pub day_of_month_threshold: f64,

    /// Share of occurrences the dominant weekday must cover (exact match only)
    pub weekday_threshold: f64,

    /// Days a pending suggestion survives without review before expiring
    pub pending_retention_days: i64,

    /// Whether irregular series still get a next-date prediction
    /// (treated as monthly). Disabling suppresses prediction entirely.
    pub predict_irregular: bool,

    /// Day-gap ranges the frequency classifier scans, in ascending order.
    /// Override via `[[frequency_ranges]]` tables in the config file.
    pub frequency_ranges: Vec<FrequencyRange>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_occurrences: 3,
            price_change_threshold: 0.05,       // 5% recorded
            price_alert_threshold: 0.10,        // 10% alerted
            irregular_consistency_threshold: 0.5,
            alert_confidence_threshold: 0.8,
            day_of_month_threshold: 0.60,
            weekday_threshold: 0.70,
            pending_retention_days: 90,
            predict_irregular: true,
            frequency_ranges: FREQUENCY_RANGES.to_vec(),
        }
    }
}

impl DetectionConfig {
    /// Load config from a TOML file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        if config.frequency_ranges.is_empty() {
            return Err(Error::Config(format!(
                "{}: frequency_ranges must not be empty",
                path.display()
            )));
        }
        Ok(config)
    }

    /// Load from the given file if present, otherwise defaults
    pub fn from_file_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            Some(p) => Err(Error::Config(format!(
                "Config file not found: {}",
                p.display()
            ))),
            None => Ok(Self::default()),
        }
    }
}
