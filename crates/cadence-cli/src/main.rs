//! Cadence CLI - Recurring charge detection and forecasting
//!
//! Usage:
//!   cadence init                  Initialize database
//!   cadence import --file CSV     Import transactions and run detection
//!   cadence detect                Re-run pattern detection
//!   cadence patterns              Review suggestions
//!   cadence predict               Show upcoming expected charges

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Init => commands::cmd_init(&cli.db, cli.no_encrypt),
        Commands::Import {
            file,
            account,
            no_detect,
        } => commands::cmd_import(
            &cli.db,
            &file,
            &account,
            no_detect,
            cli.config.as_deref(),
            cli.no_encrypt,
        ),
        Commands::Detect => commands::cmd_detect(&cli.db, cli.config.as_deref(), cli.no_encrypt),
        Commands::Patterns { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_patterns_list(&db, false, false),
                Some(PatternsAction::List { all, json }) => {
                    commands::cmd_patterns_list(&db, all, json)
                }
                Some(PatternsAction::Accept { id }) => commands::cmd_patterns_accept(&db, id),
                Some(PatternsAction::Reject { id }) => commands::cmd_patterns_reject(&db, id),
            }
        }
        Commands::Alerts { action } => {
            let db = commands::open_db(&cli.db, cli.no_encrypt)?;
            match action {
                None => commands::cmd_alerts_list(&db, false, false),
                Some(AlertsAction::List { all, json }) => commands::cmd_alerts_list(&db, all, json),
                Some(AlertsAction::Dismiss { id }) => commands::cmd_alerts_dismiss(&db, id),
                Some(AlertsAction::Action { id }) => commands::cmd_alerts_action(&db, id),
            }
        }
        Commands::Predict { days } => commands::cmd_predict(&cli.db, days, cli.no_encrypt),
        Commands::Feedback {
            pattern_id,
            accurate,
            date,
            amount,
            rating,
            note,
        } => commands::cmd_feedback(
            &cli.db,
            pattern_id,
            accurate,
            date.as_deref(),
            amount,
            rating,
            note.as_deref(),
            cli.no_encrypt,
        ),
        Commands::Status => commands::cmd_status(&cli.db, cli.no_encrypt),
    }
}
