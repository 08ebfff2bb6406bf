//! Upcoming-charge forecast command

use std::path::Path;

use anyhow::Result;
use cadence_core::PatternStatus;
use chrono::{Duration, Local};

use super::core::open_db;
use super::truncate;

/// Show accepted and pending patterns whose next expected charge falls
/// within the window.
pub fn cmd_predict(db_path: &Path, days: i64, no_encrypt: bool) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;

    let today = Local::now().date_naive();
    let horizon = today + Duration::days(days);

    let mut upcoming: Vec<_> = db
        .list_patterns(None)?
        .into_iter()
        .filter(|p| {
            matches!(p.status, PatternStatus::Accepted | PatternStatus::Pending)
        })
        .filter_map(|p| p.next_expected.map(|d| (d, p)))
        .filter(|(d, _)| *d <= horizon)
        .collect();
    upcoming.sort_by_key(|(d, _)| *d);

    if upcoming.is_empty() {
        println!("No expected charges in the next {} days.", days);
        return Ok(());
    }

    println!("📅 Expected charges through {}", horizon);
    let mut total = 0.0;
    for (date, p) in &upcoming {
        let amount = p.amount_avg.unwrap_or(0.0);
        total += amount;
        let overdue = if *date < today { " (overdue)" } else { "" };
        println!(
            "   {} {:<25} ~${:>8.2}  {}{}",
            date,
            truncate(&p.merchant, 25),
            amount,
            p.pattern_type,
            overdue,
        );
    }
    println!("   ─────────────────────────────");
    println!("   Total expected: ~${:.2}", total);

    Ok(())
}
