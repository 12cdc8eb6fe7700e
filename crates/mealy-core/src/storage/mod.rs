mod config;
pub mod credentials;
pub mod database;
pub mod period_state;

pub use config::{Config, PollerSection, RemoteSection, ScheduleSection, SessionSection};
pub use database::{Database, LocalPersistence, MemoryStore};
pub use period_state::PeriodState;

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the data directory, creating it if needed.
///
/// `MEALY_HOME` wins when set. Otherwise `~/.config/mealy[-dev]/`, with
/// `MEALY_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("MEALY_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("MEALY_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("mealy-dev")
            } else {
                base_dir.join("mealy")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
