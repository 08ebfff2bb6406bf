//! Prediction feedback command

use std::path::Path;

use anyhow::{bail, Context, Result};
use cadence_core::NewPredictionFeedback;
use chrono::NaiveDate;

use super::core::open_db;

#[allow(clippy::too_many_arguments)]
pub fn cmd_feedback(
    db_path: &Path,
    pattern_id: i64,
    accurate: bool,
    date: Option<&str>,
    amount: Option<f64>,
    rating: Option<i32>,
    note: Option<&str>,
    no_encrypt: bool,
) -> Result<()> {
    if !accurate && date.is_none() && amount.is_none() {
        bail!("Provide --accurate, or a correction via --date / --amount");
    }

    let db = open_db(db_path, no_encrypt)?;
    let pattern = db
        .get_pattern(pattern_id)?
        .with_context(|| format!("No pattern with id {}", pattern_id))?;

    let corrected_date = date
        .map(|d| {
            d.parse::<NaiveDate>()
                .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", d))
        })
        .transpose()?;

    db.record_feedback(&NewPredictionFeedback {
        pattern_id,
        original_date: pattern.next_expected,
        original_amount: pattern.amount_avg,
        original_confidence: Some(pattern.confidence_score),
        corrected_date,
        corrected_amount: amount,
        was_accurate: accurate,
        rating,
        note: note.map(String::from),
    })?;

    if accurate {
        println!("👍 Recorded: prediction for {} was accurate.", pattern.merchant);
    } else {
        println!("📝 Correction recorded for {}.", pattern.merchant);
    }
    Ok(())
}
