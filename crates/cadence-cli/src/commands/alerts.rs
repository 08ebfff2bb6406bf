//! Alert review commands

use anyhow::Result;
use cadence_core::{AlertStatus, Database};

use super::truncate;

pub fn cmd_alerts_list(db: &Database, all: bool, json: bool) -> Result<()> {
    let status = if all { None } else { Some(AlertStatus::New) };
    let alerts = db.list_alerts(status)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&alerts)?);
        return Ok(());
    }

    if alerts.is_empty() {
        println!("✅ No open alerts.");
        return Ok(());
    }

    println!("🔔 Alerts");
    for a in &alerts {
        let marker = match a.status {
            AlertStatus::New => "🆕",
            AlertStatus::Dismissed => "  ",
            AlertStatus::Actioned => "✔ ",
        };
        println!(
            "   {} [{:>4}] {:<26} {}",
            marker,
            a.id,
            a.kind.label(),
            truncate(a.message.as_deref().unwrap_or(""), 70),
        );
    }

    if !all {
        println!();
        println!("Dismiss with 'cadence alerts dismiss <ID>' or mark handled with 'cadence alerts action <ID>'.");
    }
    Ok(())
}

pub fn cmd_alerts_dismiss(db: &Database, id: i64) -> Result<()> {
    db.dismiss_alert(id)?;
    println!("Alert {} dismissed.", id);
    Ok(())
}

pub fn cmd_alerts_action(db: &Database, id: i64) -> Result<()> {
    db.action_alert(id)?;
    println!("Alert {} marked as handled.", id);
    Ok(())
}
