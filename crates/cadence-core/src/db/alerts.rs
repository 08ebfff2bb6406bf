//! Alert operations

use rusqlite::{params, Connection, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Alert, AlertKind, AlertStatus};

fn row_to_alert(row: &rusqlite::Row) -> rusqlite::Result<Alert> {
    let kind: String = row.get(1)?;
    let status: String = row.get(5)?;
    Ok(Alert {
        id: row.get(0)?,
        kind: kind.parse::<AlertKind>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, e.into())
        })?,
        pattern_id: row.get(2)?,
        price_event_id: row.get(3)?,
        message: row.get(4)?,
        status: status.parse::<AlertStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, e.into())
        })?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        resolved_at: row.get::<_, Option<String>>(7)?.map(|s| parse_datetime(&s)),
    })
}

const ALERT_COLUMNS: &str =
    "id, kind, pattern_id, price_event_id, message, status, created_at, resolved_at";

/// Create an alert on an existing connection unless an open one of the
/// same kind already points at the same pattern or price event. Returns
/// the alert id, existing or new.
pub(crate) fn create_alert(
    conn: &Connection,
    kind: AlertKind,
    pattern_id: Option<i64>,
    price_event_id: Option<i64>,
    message: &str,
) -> Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM alerts
             WHERE kind = ?1 AND status = 'new'
               AND pattern_id IS ?2 AND price_event_id IS ?3
             LIMIT 1",
            params![kind.as_str(), pattern_id, price_event_id],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    conn.execute(
        "INSERT INTO alerts (kind, pattern_id, price_event_id, message)
         VALUES (?, ?, ?, ?)",
        params![kind.as_str(), pattern_id, price_event_id, message],
    )?;
    Ok(conn.last_insert_rowid())
}

impl Database {
    /// Create an alert, deduplicated against open alerts for the same target
    pub fn create_alert(
        &self,
        kind: AlertKind,
        pattern_id: Option<i64>,
        price_event_id: Option<i64>,
        message: &str,
    ) -> Result<i64> {
        let conn = self.conn()?;
        create_alert(&conn, kind, pattern_id, price_event_id, message)
    }

    /// List alerts, optionally filtered by status, newest first
    pub fn list_alerts(&self, status: Option<AlertStatus>) -> Result<Vec<Alert>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM alerts", ALERT_COLUMNS);
        if status.is_some() {
            sql.push_str(" WHERE status = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = match status {
            Some(s) => stmt.query_map(params![s.as_str()], row_to_alert)?,
            None => stmt.query_map([], row_to_alert)?,
        }
        .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Dismiss an open alert
    pub fn dismiss_alert(&self, id: i64) -> Result<()> {
        self.resolve_alert(id, AlertStatus::Dismissed)
    }

    /// Mark an open alert as acted on
    pub fn action_alert(&self, id: i64) -> Result<()> {
        self.resolve_alert(id, AlertStatus::Actioned)
    }

    fn resolve_alert(&self, id: i64, status: AlertStatus) -> Result<()> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE alerts SET status = ?, resolved_at = CURRENT_TIMESTAMP
             WHERE id = ? AND status = 'new'",
            params![status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("No open alert with id {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::PriceChange;
    use crate::models::{Frequency, NewDetectedPattern, PatternType, PriceChangeType};

    fn seed_pattern(db: &Database, merchant: &str) -> i64 {
        db.create_account("Test").unwrap();
        db.upsert_detected_pattern(&NewDetectedPattern {
            merchant: merchant.to_string(),
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
        })
        .unwrap()
        .id()
    }

    fn seed_price_event(db: &Database, merchant: &str) -> i64 {
        db.create_account("Test").unwrap();
        db.insert_price_event(
            merchant,
            1,
            None,
            &PriceChange {
                previous_amount: 9.99,
                new_amount: 12.99,
                effective_date: "2024-06-01".parse().unwrap(),
                change_type: PriceChangeType::Increase,
                change_percentage: 30.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_create_alert_deduplicates_open_alerts() {
        let db = Database::in_memory().unwrap();
        let p1 = seed_pattern(&db, "netflix");
        let p2 = seed_pattern(&db, "spotify");
        assert_eq!((p1, p2), (1, 2));

        let a = db.create_alert(AlertKind::NewPattern, Some(1), None, "netflix looks monthly").unwrap();
        let b = db.create_alert(AlertKind::NewPattern, Some(1), None, "netflix looks monthly").unwrap();
        assert_eq!(a, b);
        assert_eq!(db.list_alerts(None).unwrap().len(), 1);

        // Different pattern gets its own alert
        let c = db.create_alert(AlertKind::NewPattern, Some(2), None, "spotify looks monthly").unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_dismissed_alert_allows_new_one() {
        let db = Database::in_memory().unwrap();
        let ev = seed_price_event(&db, "netflix");
        assert_eq!(ev, 1);

        let a = db.create_alert(AlertKind::PriceChange, None, Some(1), "netflix went up").unwrap();
        db.dismiss_alert(a).unwrap();

        let b = db.create_alert(AlertKind::PriceChange, None, Some(1), "netflix went up").unwrap();
        assert_ne!(a, b);
        assert_eq!(db.list_alerts(Some(AlertStatus::New)).unwrap().len(), 1);
        assert_eq!(db.list_alerts(Some(AlertStatus::Dismissed)).unwrap().len(), 1);
    }

    #[test]
    fn test_resolution_is_terminal() {
        let db = Database::in_memory().unwrap();
        let p = seed_pattern(&db, "netflix");
        assert_eq!(p, 1);

        let a = db.create_alert(AlertKind::NewPattern, Some(1), None, "msg").unwrap();
        db.action_alert(a).unwrap();
        assert!(db.dismiss_alert(a).is_err());

        let alert = &db.list_alerts(None).unwrap()[0];
        assert_eq!(alert.status, AlertStatus::Actioned);
        assert!(alert.resolved_at.is_some());
    }
}
