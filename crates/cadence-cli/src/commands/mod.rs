//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Core commands (init, detect) and shared utilities (open_db)
//! - `import` - CSV import command
//! - `patterns` - Pattern review commands (list, accept, reject)
//! - `alerts` - Alert review commands (list, dismiss, action)
//! - `predict` - Upcoming-charge forecast command
//! - `feedback` - Prediction feedback command
//! - `status` - Database status command

pub mod alerts;
pub mod core;
pub mod feedback;
pub mod import;
pub mod patterns;
pub mod predict;
pub mod status;

// Re-export command functions for main.rs
pub use alerts::*;
pub use core::*;
pub use feedback::*;
pub use import::*;
pub use patterns::*;
pub use predict::*;
pub use status::*;

/// Truncate a string to a maximum number of characters, adding "..." if
/// truncated. Cuts on char boundaries, so multibyte merchant names are safe.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
