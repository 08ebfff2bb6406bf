//! Detected-pattern persistence and review lifecycle
//!
//! Detection runs are idempotent against this table: a re-run refreshes
//! the pending suggestion for a (merchant, account, pattern_type) key
//! instead of stacking duplicates, and never touches a suggestion the
//! user has already accepted or rejected.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{DetectedPattern, NewDetectedPattern, PatternStatus, PatternType};

/// What a detection run did with a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternUpsert {
    /// New pending suggestion inserted
    Created(i64),
    /// Existing pending suggestion refreshed in place
    Updated(i64),
    /// A resolved (accepted/rejected) suggestion already covers this key
    Unchanged(i64),
}

impl PatternUpsert {
    pub fn id(&self) -> i64 {
        match self {
            Self::Created(id) | Self::Updated(id) | Self::Unchanged(id) => *id,
        }
    }
}

const PATTERN_COLUMNS: &str = "id, merchant, account_id, pattern_type, confidence_score, \
     interval_days, amount_min, amount_max, amount_avg, occurrence_count, \
     typical_day_of_month, typical_weekday, first_occurrence, last_occurrence, \
     next_expected, status, resolved_at, created_at";

fn row_to_pattern(row: &rusqlite::Row) -> rusqlite::Result<DetectedPattern> {
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

    let pattern_type: String = row.get(3)?;
    let status: String = row.get(15)?;

    Ok(DetectedPattern {
        id: row.get(0)?,
        merchant: row.get(1)?,
        account_id: row.get(2)?,
        pattern_type: pattern_type.parse::<PatternType>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?,
        confidence_score: row.get(4)?,
        interval_days: row.get(5)?,
        amount_min: row.get(6)?,
        amount_max: row.get(7)?,
        amount_avg: row.get(8)?,
        occurrence_count: row.get(9)?,
        typical_day_of_month: row.get(10)?,
        typical_weekday: row.get(11)?,
        first_occurrence: parse_date(12, row.get(12)?)?,
        last_occurrence: parse_date(13, row.get(13)?)?,
        next_expected: parse_date(14, row.get(14)?)?,
        status: status.parse::<PatternStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                15,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?,
        resolved_at: row.get::<_, Option<String>>(16)?.map(|s| parse_datetime(&s)),
        created_at: parse_datetime(&row.get::<_, String>(17)?),
    })
}

/// Insert or refresh a detection candidate on an existing connection,
/// so a detection run can group it with related writes in one transaction.
///
/// Key is (merchant, account_id, pattern_type). A pending row for the
/// key is updated in place; an accepted or rejected row blocks the
/// candidate entirely; an expired row (or no row) gets a fresh
/// pending insert.
pub(crate) fn upsert_detected_pattern(
    conn: &Connection,
    candidate: &NewDetectedPattern,
) -> Result<PatternUpsert> {
    let existing: Option<(i64, String)> = conn
        .query_row(
            "SELECT id, status FROM detected_patterns
             WHERE merchant = ? AND account_id = ? AND pattern_type = ?
             ORDER BY created_at DESC LIMIT 1",
            params![
                candidate.merchant,
                candidate.account_id,
                candidate.pattern_type.as_str()
            ],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    if let Some((id, status)) = existing {
        match status.parse::<PatternStatus>().map_err(Error::InvalidData)? {
            PatternStatus::Accepted | PatternStatus::Rejected => {
                return Ok(PatternUpsert::Unchanged(id));
            }
            PatternStatus::Pending => {
                conn.execute(
                    r#"
                    UPDATE detected_patterns
                    SET confidence_score = ?, interval_days = ?,
                        amount_min = ?, amount_max = ?, amount_avg = ?,
                        occurrence_count = ?, typical_day_of_month = ?, typical_weekday = ?,
                        first_occurrence = ?, last_occurrence = ?, next_expected = ?
                    WHERE id = ?
                    "#,
                    params![
                        candidate.confidence_score,
                        candidate.interval_days,
                        candidate.amount_min,
                        candidate.amount_max,
                        candidate.amount_avg,
                        candidate.occurrence_count,
                        candidate.typical_day_of_month,
                        candidate.typical_weekday,
                        candidate.first_occurrence.map(|d| d.to_string()),
                        candidate.last_occurrence.map(|d| d.to_string()),
                        candidate.next_expected.map(|d| d.to_string()),
                        id,
                    ],
                )?;
                return Ok(PatternUpsert::Updated(id));
            }
            PatternStatus::Expired => {}
        }
    }

    conn.execute(
        r#"
        INSERT INTO detected_patterns
            (merchant, account_id, pattern_type, confidence_score, interval_days,
             amount_min, amount_max, amount_avg, occurrence_count,
             typical_day_of_month, typical_weekday,
             first_occurrence, last_occurrence, next_expected, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending')
        "#,
        params![
            candidate.merchant,
            candidate.account_id,
            candidate.pattern_type.as_str(),
            candidate.confidence_score,
            candidate.interval_days,
            candidate.amount_min,
            candidate.amount_max,
            candidate.amount_avg,
            candidate.occurrence_count,
            candidate.typical_day_of_month,
            candidate.typical_weekday,
            candidate.first_occurrence.map(|d| d.to_string()),
            candidate.last_occurrence.map(|d| d.to_string()),
            candidate.next_expected.map(|d| d.to_string()),
        ],
    )?;
    Ok(PatternUpsert::Created(conn.last_insert_rowid()))
}

impl Database {
    /// Insert or refresh a detection candidate. The connection-level
    /// `upsert_detected_pattern` above documents the keying rules.
    pub fn upsert_detected_pattern(&self, candidate: &NewDetectedPattern) -> Result<PatternUpsert> {
        let conn = self.conn()?;
        upsert_detected_pattern(&conn, candidate)
    }

    pub fn get_pattern(&self, id: i64) -> Result<Option<DetectedPattern>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM detected_patterns WHERE id = ?", PATTERN_COLUMNS),
            params![id],
            row_to_pattern,
        )
        .optional()
        .map_err(Into::into)
    }

    /// List patterns, optionally filtered by status, highest confidence first
    pub fn list_patterns(&self, status: Option<PatternStatus>) -> Result<Vec<DetectedPattern>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM detected_patterns", PATTERN_COLUMNS);
        if status.is_some() {
            sql.push_str(" WHERE status = ?");
        }
        sql.push_str(" ORDER BY confidence_score DESC, merchant");

        let mut stmt = conn.prepare(&sql)?;
        let rows = match status {
            Some(s) => stmt.query_map(params![s.as_str()], row_to_pattern)?,
            None => stmt.query_map([], row_to_pattern)?,
        }
        .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Accept a pending suggestion. Only pending suggestions can be accepted.
    pub fn accept_pattern(&self, id: i64) -> Result<()> {
        self.resolve_pattern(id, PatternStatus::Accepted)
    }

    /// Reject a pending suggestion. Only pending suggestions can be rejected.
    pub fn reject_pattern(&self, id: i64) -> Result<()> {
        self.resolve_pattern(id, PatternStatus::Rejected)
    }

    fn resolve_pattern(&self, id: i64, status: PatternStatus) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE detected_patterns
             SET status = ?, resolved_at = CURRENT_TIMESTAMP
             WHERE id = ? AND status = 'pending'",
            params![status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("No pending pattern with id {}", id)));
        }
        Ok(())
    }

    /// Expire pending suggestions older than `retention_days`. Returns how
    /// many were expired.
    pub fn expire_stale_patterns(&self, retention_days: i64) -> Result<usize> {
        let conn = self.conn()?;
        let expired = conn.execute(
            "UPDATE detected_patterns
             SET status = 'expired', resolved_at = CURRENT_TIMESTAMP
             WHERE status = 'pending'
               AND created_at < datetime('now', ?)",
            params![format!("-{} days", retention_days)],
        )?;
        Ok(expired)
    }

    /// Update the stored prediction for a pattern
    pub fn set_next_expected(&self, id: i64, next_expected: Option<NaiveDate>) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE detected_patterns SET next_expected = ? WHERE id = ?",
            params![next_expected.map(|d| d.to_string()), id],
        )?;
        Ok(())
    }
}
