//! Transaction operations

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension};

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::{NewTransaction, Occurrence, OccurrenceSeries, Transaction};

/// Result of inserting a transaction
#[derive(Debug, Clone)]
pub enum TransactionInsertResult {
    /// Transaction was inserted successfully, contains new transaction ID
    Inserted(i64),
    /// Transaction was a duplicate, contains existing transaction ID
    Duplicate(i64),
}

fn row_to_transaction(row: &rusqlite::Row) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        date: row
            .get::<_, String>(2)?
            .parse::<NaiveDate>()
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
            })?,
        description: row.get(3)?,
        amount: row.get(4)?,
        merchant_normalized: row.get(5)?,
        import_hash: row.get(6)?,
        archived: row.get(7)?,
        is_transfer: row.get(8)?,
        created_at: parse_datetime(&row.get::<_, String>(9)?),
    })
}

const TX_COLUMNS: &str = "id, account_id, date, description, amount, merchant_normalized, \
     import_hash, archived, is_transfer, created_at";

impl Database {
    /// Insert a transaction (skips duplicates based on import_hash)
    pub fn insert_transaction(
        &self,
        account_id: i64,
        tx: &NewTransaction,
    ) -> Result<TransactionInsertResult> {
        let conn = self.conn()?;

        // Check for duplicate
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM transactions WHERE import_hash = ?",
                params![tx.import_hash],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(existing_id) = existing {
            return Ok(TransactionInsertResult::Duplicate(existing_id));
        }

        conn.execute(
            r#"
            INSERT INTO transactions (account_id, date, description, amount, merchant_normalized, import_hash, is_transfer)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                account_id,
                tx.date.to_string(),
                tx.description,
                tx.amount,
                tx.merchant_normalized,
                tx.import_hash,
                tx.is_transfer,
            ],
        )?;

        Ok(TransactionInsertResult::Inserted(conn.last_insert_rowid()))
    }

    /// List transactions, newest first
    pub fn list_transactions(
        &self,
        account_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM transactions WHERE archived = 0", TX_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(aid) = account_id {
            sql.push_str(" AND account_id = ?");
            params.push(Box::new(aid));
        }
        sql.push_str(" ORDER BY date DESC, id DESC LIMIT ? OFFSET ?");
        params.push(Box::new(limit));
        params.push(Box::new(offset));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(params.iter().map(|p| p.as_ref())), row_to_transaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_transactions(&self) -> Result<i64> {
        let conn = self.conn()?;
        let count =
            conn.query_row("SELECT COUNT(*) FROM transactions WHERE archived = 0", [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    /// Set the archived flag on a transaction
    pub fn archive_transaction(&self, id: i64, archived: bool) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE transactions SET archived = ? WHERE id = ?",
            params![archived, id],
        )?;
        Ok(())
    }

    /// Group analyzable charges into per-merchant occurrence series.
    ///
    /// Analyzable means: not archived, not a transfer, and a charge
    /// (negative amount). Grouping key is (account, merchant), where the
    /// merchant is `merchant_normalized` falling back to the raw
    /// description. Occurrences come back date ascending within each
    /// series.
    pub fn occurrence_series(&self) -> Result<Vec<OccurrenceSeries>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT account_id,
                   COALESCE(merchant_normalized, description) AS merchant,
                   date,
                   amount
            FROM transactions
            WHERE archived = 0 AND is_transfer = 0 AND amount < 0
            ORDER BY account_id, merchant, date, id
            "#,
        )?;

        let mut series: Vec<OccurrenceSeries> = Vec::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
            ))
        })?;

        for row in rows {
            let (account_id, merchant, date, amount) = row?;
            let date = date.parse::<NaiveDate>().map_err(|e| {
                crate::error::Error::InvalidData(format!("bad transaction date: {}", e))
            })?;
            let occurrence = Occurrence { date, amount };

            match series.last_mut() {
                Some(s) if s.account_id == account_id && s.merchant == merchant => {
                    s.occurrences.push(occurrence);
                }
                _ => series.push(OccurrenceSeries {
                    merchant,
                    account_id,
                    occurrences: vec![occurrence],
                }),
            }
        }

        Ok(series)
    }

    /// Occurrences for one merchant on one account, date ascending
    pub fn occurrences_for_merchant(
        &self,
        merchant: &str,
        account_id: Option<i64>,
    ) -> Result<Vec<Occurrence>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT date, amount
            FROM transactions
            WHERE archived = 0 AND is_transfer = 0 AND amount < 0
              AND COALESCE(merchant_normalized, description) = ?
              AND (?2 IS NULL OR account_id = ?2)
            ORDER BY date, id
            "#,
        )?;

        let rows = stmt.query_map(params![merchant, account_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?))
        })?;

        let mut occurrences = Vec::new();
        for row in rows {
            let (date, amount) = row?;
            let date = date.parse::<NaiveDate>().map_err(|e| {
                crate::error::Error::InvalidData(format!("bad transaction date: {}", e))
            })?;
            occurrences.push(Occurrence { date, amount });
        }
        Ok(occurrences)
    }
}
