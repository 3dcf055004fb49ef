mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, PlannerConfig};
pub use database::{PlanStore, TripMeta, TripSummary};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/dutyplan[-dev]/` based on DUTYPLAN_ENV.
///
/// Set DUTYPLAN_ENV=dev to use the development data directory, or
/// DUTYPLAN_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("DUTYPLAN_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("DUTYPLAN_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("dutyplan-dev")
            } else {
                base_dir.join("dutyplan")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
