//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Cadence - Recurring charge detection and forecasting
#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Detect recurring charges and forecast upcoming ones", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, default_value = "cadence.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable database encryption (not recommended for production)
    ///
    /// By default, the database is encrypted using SQLCipher.
    /// Set CADENCE_DB_KEY environment variable with your passphrase.
    /// Use --no-encrypt only for development or testing.
    #[arg(long, global = true)]
    pub no_encrypt: bool,

    /// Detection config file (TOML). Defaults are used if not given.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init,

    /// Import transactions from CSV (Date,Description,Amount)
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Account name to import into
        #[arg(short, long, default_value = "default")]
        account: String,

        /// Skip pattern detection after import
        #[arg(long)]
        no_detect: bool,
    },

    /// Run recurring-pattern detection
    Detect,

    /// Review detected patterns
    Patterns {
        #[command(subcommand)]
        action: Option<PatternsAction>,
    },

    /// Review alerts
    Alerts {
        #[command(subcommand)]
        action: Option<AlertsAction>,
    },

    /// Show upcoming predicted charges
    Predict {
        /// How many days ahead to look
        #[arg(short, long, default_value = "30")]
        days: i64,
    },

    /// Record feedback on a prediction
    Feedback {
        /// Pattern ID the prediction belongs to
        pattern_id: i64,

        /// The prediction was accurate
        #[arg(long, conflicts_with_all = ["date", "amount"])]
        accurate: bool,

        /// Corrected date (YYYY-MM-DD) the charge actually landed
        #[arg(long)]
        date: Option<String>,

        /// Corrected amount
        #[arg(long)]
        amount: Option<f64>,

        /// Optional 1-5 usefulness rating
        #[arg(long)]
        rating: Option<i32>,

        /// Optional note
        #[arg(long)]
        note: Option<String>,
    },

    /// Show database status
    Status,
}

#[derive(Subcommand)]
pub enum PatternsAction {
    /// List patterns (pending by default)
    List {
        /// Include resolved patterns
        #[arg(long)]
        all: bool,

        /// Emit JSON instead of the table
        #[arg(long)]
        json: bool,
    },

    /// Accept a pending suggestion
    Accept {
        /// Pattern ID
        id: i64,
    },

    /// Reject a pending suggestion
    Reject {
        /// Pattern ID
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum AlertsAction {
    /// List alerts (open by default)
    List {
        /// Include resolved alerts
        #[arg(long)]
        all: bool,

        /// Emit JSON instead of the table
        #[arg(long)]
        json: bool,
    },

    /// Dismiss an open alert
    Dismiss {
        /// Alert ID
        id: i64,
    },

    /// Mark an open alert as acted on
    Action {
        /// Alert ID
        id: i64,
    },
}
