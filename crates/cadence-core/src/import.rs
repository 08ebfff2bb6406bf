//! CSV import and merchant normalization

use chrono::NaiveDate;
use csv::ReaderBuilder;
use sha2::{Digest, Sha256};
use std::io::Read;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::NewTransaction;

/// Generate a unique hash for deduplication
pub fn compute_import_hash(date: NaiveDate, description: &str, amount: f64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(date.to_string().as_bytes());
    hasher.update(description.as_bytes());
    hasher.update(amount.to_be_bytes());
    hex::encode(hasher.finalize())
}

/// Normalize a raw bank description into a grouping key.
///
/// Lowercases, strips trailing store/reference digits and punctuation
/// noise, and collapses whitespace. "NETFLIX.COM 880123" and
/// "Netflix.com" group together; distinct merchants stay distinct.
pub fn normalize_merchant(description: &str) -> String {
    let lowered = description.to_lowercase();

    let mut words: Vec<&str> = lowered
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c == '*' || c == '#' || c == '-' || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();

    // Drop trailing tokens that are store numbers or references: all
    // digits, or mostly digits (e.g. "x1234")
    while let Some(last) = words.last() {
        let digits = last.chars().filter(|c| c.is_ascii_digit()).count();
        if digits > 0 && digits * 2 >= last.len() {
            words.pop();
        } else {
            break;
        }
    }

    if words.is_empty() {
        // Everything looked like a reference; fall back to the raw form
        return lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    words.join(" ")
}

/// Parse CSV data into transactions
///
/// Format: `Date,Description,Amount` with a header row. Dates accept the
/// common bank formats; amounts accept currency symbols, commas, and
/// parenthesized negatives. Negative amounts are charges.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<NewTransaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut transactions = Vec::new();

    for result in rdr.records() {
        let record = result?;

        let date_str = record
            .get(0)
            .ok_or_else(|| Error::Import("Missing date".into()))?;
        let date = parse_date(date_str)?;

        let description = record
            .get(1)
            .ok_or_else(|| Error::Import("Missing description".into()))?
            .trim()
            .to_string();

        let amount_str = record
            .get(2)
            .ok_or_else(|| Error::Import("Missing amount".into()))?;
        let amount = parse_amount(amount_str)?;

        let import_hash = compute_import_hash(date, &description, amount);
        let merchant_normalized = Some(normalize_merchant(&description));

        transactions.push(NewTransaction {
            date,
            description,
            amount,
            merchant_normalized,
            import_hash,
            is_transfer: false,
        });
    }

    debug!("Parsed {} transactions", transactions.len());
    Ok(transactions)
}

/// Parse a date string in various common formats
fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d", // 2024-01-15
        "%m/%d/%Y", // 01/15/2024
        "%m/%d/%y", // 01/15/24
        "%m-%d-%Y", // 01-15-2024
    ];

    for fmt in formats {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    Err(Error::Import(format!("Unable to parse date: {}", s)))
}

/// Parse an amount string, handling currency symbols and commas
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .map_err(|_| Error::Import(format!("Unable to parse amount: {}", s)))
}
