//! Database status command

use std::path::Path;

use anyhow::Result;
use cadence_core::{AlertStatus, PatternStatus};

use super::core::open_db;

pub fn cmd_status(db_path: &Path, no_encrypt: bool) -> Result<()> {
    let db = open_db(db_path, no_encrypt)?;

    println!("📦 Database: {}", db.path());
    if db.is_encrypted().unwrap_or(false) {
        println!("   🔒 Encryption: ENABLED");
    } else {
        println!("   ⚠️  Encryption: DISABLED");
    }

    let accounts = db.list_accounts()?;
    println!("   Accounts:          {}", accounts.len());
    println!("   Transactions:      {}", db.count_transactions()?);
    println!(
        "   Pending patterns:  {}",
        db.list_patterns(Some(PatternStatus::Pending))?.len()
    );
    println!(
        "   Accepted patterns: {}",
        db.list_patterns(Some(PatternStatus::Accepted))?.len()
    );
    println!(
        "   Open alerts:       {}",
        db.list_alerts(Some(AlertStatus::New))?.len()
    );
    println!("   Price events:      {}", db.list_price_events(None)?.len());

    Ok(())
}
