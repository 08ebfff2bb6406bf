//! Pattern review commands

use anyhow::Result;
use cadence_core::{Database, PatternStatus};

use super::truncate;

pub fn cmd_patterns_list(db: &Database, all: bool, json: bool) -> Result<()> {
    let status = if all { None } else { Some(PatternStatus::Pending) };
    let patterns = db.list_patterns(status)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&patterns)?);
        return Ok(());
    }

    if patterns.is_empty() {
        if all {
            println!("No patterns detected yet. Run 'cadence detect' after importing.");
        } else {
            println!("✅ No pending suggestions.");
        }
        return Ok(());
    }

    println!("🔁 Detected patterns");
    println!(
        "   {:<5} {:<25} {:<18} {:>5} {:>9} {:<12} {:<10}",
        "ID", "Merchant", "Cadence", "Conf", "Amount", "Next", "Status"
    );
    for p in &patterns {
        let amount = p
            .amount_avg
            .map(|a| format!("${:.2}", a))
            .unwrap_or_else(|| "-".to_string());
        let next = p
            .next_expected
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "   {:<5} {:<25} {:<18} {:>4.0}% {:>9} {:<12} {:<10}",
            p.id,
            truncate(&p.merchant, 25),
            p.pattern_type.to_string(),
            p.confidence_score * 100.0,
            amount,
            next,
            p.status.to_string(),
        );
    }

    if !all {
        println!();
        println!("Accept with 'cadence patterns accept <ID>', reject with 'cadence patterns reject <ID>'.");
    }
    Ok(())
}

pub fn cmd_patterns_accept(db: &Database, id: i64) -> Result<()> {
    db.accept_pattern(id)?;
    println!("✅ Pattern {} accepted.", id);
    Ok(())
}

pub fn cmd_patterns_reject(db: &Database, id: i64) -> Result<()> {
    db.reject_pattern(id)?;
    println!("🚫 Pattern {} rejected. It will not be suggested again.", id);
    Ok(())
}
