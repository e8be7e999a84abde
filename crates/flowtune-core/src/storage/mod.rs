pub mod session_log;
pub mod state_store;

pub use session_log::{DailyAggregates, OutcomeRecord, SessionLog};
pub use state_store::{MemoryStateStore, Namespace, SqliteStateStore, StateStore};

use std::path::PathBuf;

/// Returns `~/.config/flowtune[-dev]/` based on FLOWTUNE_ENV.
///
/// Set FLOWTUNE_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FLOWTUNE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("flowtune-dev")
    } else {
        base_dir.join("flowtune")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
