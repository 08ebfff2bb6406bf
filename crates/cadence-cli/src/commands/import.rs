//! CSV import command

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use cadence_core::{import, DetectionConfig, PatternDetector, TransactionInsertResult};

use super::core::{open_db, print_detection_results};

pub fn cmd_import(
    db_path: &Path,
    file: &Path,
    account: &str,
    no_detect: bool,
    config_path: Option<&Path>,
    no_encrypt: bool,
) -> Result<()> {
    println!("📥 Importing {}...", file.display());

    let db = open_db(db_path, no_encrypt)?;
    let account_id = db
        .create_account(account)
        .with_context(|| format!("Failed to create account '{}'", account))?;

    let reader =
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let transactions = import::parse_csv(reader).context("Failed to parse CSV")?;

    let mut imported = 0;
    let mut skipped = 0;
    for tx in &transactions {
        match db.insert_transaction(account_id, tx)? {
            TransactionInsertResult::Inserted(_) => imported += 1,
            TransactionInsertResult::Duplicate(_) => skipped += 1,
        }
    }

    println!(
        "   Imported {} transactions into '{}' ({} duplicates skipped)",
        imported, account, skipped
    );

    if no_detect {
        println!("   Detection skipped (--no-detect)");
        return Ok(());
    }

    println!("🔍 Running pattern detection...");
    let config = DetectionConfig::from_file_or_default(config_path)
        .context("Failed to load detection config")?;
    let results = PatternDetector::with_config(&db, config).detect_all()?;
    print_detection_results(&results);

    Ok(())
}
