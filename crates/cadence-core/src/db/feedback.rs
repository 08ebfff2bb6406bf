//! Prediction feedback capture
//!
//! Feedback rows record how a prediction fared against reality. They are
//! kept verbatim for an external recalibration pass; nothing here changes
//! pattern parameters.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{NewPredictionFeedback, PredictionFeedback};

fn row_to_feedback(row: &rusqlite::Row) -> rusqlite::Result<PredictionFeedback> {
    let parse_date = |idx: usize, value: Option<String>| -> rusqlite::Result<Option<NaiveDate>> {
        value
            .map(|s| {
                s.parse::<NaiveDate>().map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        idx,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })
            })
            .transpose()
    };

    Ok(PredictionFeedback {
        id: row.get(0)?,
        pattern_id: row.get(1)?,
        original_date: parse_date(2, row.get(2)?)?,
        original_amount: row.get(3)?,
        original_confidence: row.get(4)?,
        corrected_date: parse_date(5, row.get(5)?)?,
        corrected_amount: row.get(6)?,
        was_accurate: row.get(7)?,
        rating: row.get(8)?,
        note: row.get(9)?,
        created_at: parse_datetime(&row.get::<_, String>(10)?),
        resolved_at: row.get::<_, Option<String>>(11)?.map(|s| parse_datetime(&s)),
    })
}

const FEEDBACK_COLUMNS: &str = "id, pattern_id, original_date, original_amount, \
     original_confidence, corrected_date, corrected_amount, was_accurate, rating, note, \
     created_at, resolved_at";

impl Database {
    /// Record feedback against a pattern's prediction. The pattern must
    /// exist; the rating, when present, must be 1-5.
    pub fn record_feedback(&self, feedback: &NewPredictionFeedback) -> Result<i64> {
        if let Some(rating) = feedback.rating {
            if !(1..=5).contains(&rating) {
                return Err(Error::InvalidData(format!(
                    "Rating must be 1-5, got {}",
                    rating
                )));
            }
        }

        let conn = self.conn()?;

        let pattern_exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM detected_patterns WHERE id = ?",
                params![feedback.pattern_id],
                |row| row.get(0),
            )
            .optional()?;
        if pattern_exists.is_none() {
            return Err(Error::NotFound(format!(
                "No pattern with id {}",
                feedback.pattern_id
            )));
        }

        conn.execute(
            r#"
            INSERT INTO prediction_feedback
                (pattern_id, original_date, original_amount, original_confidence,
                 corrected_date, corrected_amount, was_accurate, rating, note)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                feedback.pattern_id,
                feedback.original_date.map(|d| d.to_string()),
                feedback.original_amount,
                feedback.original_confidence,
                feedback.corrected_date.map(|d| d.to_string()),
                feedback.corrected_amount,
                feedback.was_accurate,
                feedback.rating,
                feedback.note,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// List feedback, newest first, optionally scoped to one pattern
    pub fn list_feedback(&self, pattern_id: Option<i64>) -> Result<Vec<PredictionFeedback>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM prediction_feedback", FEEDBACK_COLUMNS);
        if pattern_id.is_some() {
            sql.push_str(" WHERE pattern_id = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = match pattern_id {
            Some(id) => stmt.query_map(params![id], row_to_feedback)?,
            None => stmt.query_map([], row_to_feedback)?,
        }
        .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Mark a feedback row as consumed by a recalibration pass
    pub fn resolve_feedback(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE prediction_feedback SET resolved_at = CURRENT_TIMESTAMP
             WHERE id = ? AND resolved_at IS NULL",
            params![id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("No unresolved feedback with id {}", id)));
        }
        Ok(())
    }
}
