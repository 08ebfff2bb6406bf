//! Price-change event log
//!
//! Append-only: events are never updated or deleted, and a detection
//! re-run only appends events newer than the latest one already stored
//! for the series.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

use super::{parse_datetime, Database};
use crate::analysis::PriceChange;
use crate::error::Result;
use crate::models::{PriceChangeEvent, PriceChangeType};

fn row_to_event(row: &rusqlite::Row) -> rusqlite::Result<PriceChangeEvent> {
    let change_type: String = row.get(7)?;
    let effective_date: String = row.get(6)?;
    Ok(PriceChangeEvent {
        id: row.get(0)?,
        merchant: row.get(1)?,
        account_id: row.get(2)?,
        pattern_id: row.get(3)?,
        previous_amount: row.get(4)?,
        new_amount: row.get(5)?,
        effective_date: effective_date.parse::<NaiveDate>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?,
        change_type: change_type.parse::<PriceChangeType>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, e.into())
        })?,
        change_percentage: row.get(8)?,
        created_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

const EVENT_COLUMNS: &str = "id, merchant, account_id, pattern_id, previous_amount, \
     new_amount, effective_date, change_type, change_percentage, created_at";

/// Append a price-change event on an existing connection
pub(crate) fn insert_price_event(
    conn: &Connection,
    merchant: &str,
    account_id: i64,
    pattern_id: Option<i64>,
    change: &PriceChange,
) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO price_change_events
            (merchant, account_id, pattern_id, previous_amount, new_amount,
             effective_date, change_type, change_percentage)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            merchant,
            account_id,
            pattern_id,
            change.previous_amount,
            change.new_amount,
            change.effective_date.to_string(),
            change.change_type.as_str(),
            change.change_percentage,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Latest stored effective date for a series, if any events exist.
/// Detection uses this to append only genuinely new events.
pub(crate) fn latest_price_event_date(
    conn: &Connection,
    merchant: &str,
    account_id: i64,
) -> Result<Option<NaiveDate>> {
    let latest: Option<String> = conn
        .query_row(
            "SELECT MAX(effective_date) FROM price_change_events
             WHERE merchant = ? AND account_id = ?",
            params![merchant, account_id],
            |row| row.get(0),
        )
        .optional()?
        .flatten();

    latest
        .map(|s| {
            s.parse::<NaiveDate>()
                .map_err(|e| crate::error::Error::InvalidData(format!("bad event date: {}", e)))
        })
        .transpose()
}

impl Database {
    /// Append a price-change event for a series
    pub fn insert_price_event(
        &self,
        merchant: &str,
        account_id: i64,
        pattern_id: Option<i64>,
        change: &PriceChange,
    ) -> Result<i64> {
        let conn = self.conn()?;
        insert_price_event(&conn, merchant, account_id, pattern_id, change)
    }

    /// Latest stored effective date for a series, if any events exist
    pub fn latest_price_event_date(
        &self,
        merchant: &str,
        account_id: i64,
    ) -> Result<Option<NaiveDate>> {
        let conn = self.conn()?;
        latest_price_event_date(&conn, merchant, account_id)
    }

    /// List events, newest first, optionally for one merchant
    pub fn list_price_events(&self, merchant: Option<&str>) -> Result<Vec<PriceChangeEvent>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM price_change_events", EVENT_COLUMNS);
        if merchant.is_some() {
            sql.push_str(" WHERE merchant = ?");
        }
        sql.push_str(" ORDER BY effective_date DESC, id DESC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = match merchant {
            Some(m) => stmt.query_map(params![m], row_to_event)?,
            None => stmt.query_map([], row_to_event)?,
        }
        .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(date: &str, previous: f64, new: f64) -> PriceChange {
        let relative = (new - previous) / previous;
        PriceChange {
            previous_amount: previous,
            new_amount: new,
            effective_date: date.parse().unwrap(),
            change_type: if relative > 0.0 {
                PriceChangeType::Increase
            } else {
                PriceChangeType::Decrease
            },
            change_percentage: relative * 100.0,
        }
    }

    #[test]
    fn test_insert_and_list() {
        let db = Database::in_memory().unwrap();
        db.create_account("Checking").unwrap();

        db.insert_price_event("netflix", 1, None, &change("2024-03-01", 9.99, 12.99)).unwrap();
        db.insert_price_event("spotify", 1, None, &change("2024-04-01", 10.99, 11.99)).unwrap();

        assert_eq!(db.list_price_events(None).unwrap().len(), 2);
        let netflix = db.list_price_events(Some("netflix")).unwrap();
        assert_eq!(netflix.len(), 1);
        assert_eq!(netflix[0].change_type, PriceChangeType::Increase);
        assert!((netflix[0].change_percentage - 30.03).abs() < 0.01);
    }

    #[test]
    fn test_latest_event_date() {
        let db = Database::in_memory().unwrap();
        db.create_account("Checking").unwrap();

        assert!(db.latest_price_event_date("netflix", 1).unwrap().is_none());

        db.insert_price_event("netflix", 1, None, &change("2024-03-01", 9.99, 12.99)).unwrap();
        db.insert_price_event("netflix", 1, None, &change("2024-06-01", 12.99, 11.99)).unwrap();

        assert_eq!(
            db.latest_price_event_date("netflix", 1).unwrap(),
            Some("2024-06-01".parse().unwrap())
        );
        // Scoped by account
        assert!(db.latest_price_event_date("netflix", 2).unwrap().is_none());
    }
}
