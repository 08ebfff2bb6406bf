//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `cmd_init` - Initialize the database
//! - `cmd_detect` - Run recurring-pattern detection

use std::path::Path;

use anyhow::{Context, Result};
use cadence_core::{Database, DetectionConfig, PatternDetector};

/// Open database with encryption by default, or unencrypted if --no-encrypt
pub fn open_db(db_path: &Path, no_encrypt: bool) -> Result<Database> {
    let path_str = db_path.to_str().context("Database path is not valid UTF-8")?;
    if no_encrypt {
        Database::new_unencrypted(path_str).context("Failed to open database (unencrypted)")
    } else {
        Database::new(path_str).context("Failed to open database")
    }
}

pub fn cmd_init(db_path: &Path, no_encrypt: bool) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let _db = open_db(db_path, no_encrypt)?;

    if no_encrypt {
        println!("   ⚠️  Encryption: DISABLED (--no-encrypt)");
    } else {
        println!("   🔒 Encryption: ENABLED");
    }

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    println!("  1. Import transactions: cadence import --file statement.csv");
    println!("  2. Review suggestions:  cadence patterns");

    Ok(())
}

pub fn cmd_detect(db_path: &Path, config_path: Option<&Path>, no_encrypt: bool) -> Result<()> {
    println!("🔍 Running pattern detection...");

    let db = open_db(db_path, no_encrypt)?;
    let config = DetectionConfig::from_file_or_default(config_path)
        .context("Failed to load detection config")?;

    let results = PatternDetector::with_config(&db, config).detect_all()?;
    print_detection_results(&results);
    Ok(())
}

pub fn print_detection_results(results: &cadence_core::DetectionResults) {
    println!();
    println!("📊 Detection Results");
    println!("   ─────────────────────────────");
    println!("   Series analyzed:   {}", results.series_analyzed);
    println!("   🆕 New patterns:    {}", results.patterns_created);
    println!("   🔄 Updated:         {}", results.patterns_updated);
    println!("   ⏳ Expired pending: {}", results.patterns_expired);
    println!("   💲 Price events:    {}", results.price_events);

    if results.alerts_created > 0 {
        println!();
        println!(
            "⚠️  {} new alerts. Run 'cadence alerts' to see details.",
            results.alerts_created
        );
    } else {
        println!();
        println!("✅ Nothing new needs your attention.");
    }
}
