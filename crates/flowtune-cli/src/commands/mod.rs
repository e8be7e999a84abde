pub mod config;
pub mod recommend;
pub mod record;
pub mod state;
pub mod stats;

use flowtune_core::{
    ContextKey, EnergyLevel, EngineConfig, RecommendationEngine, SessionLog, SqliteStateStore,
};

/// Parse an energy level argument.
pub fn parse_energy(value: &str) -> Result<EnergyLevel, String> {
    match value {
        "low" => Ok(EnergyLevel::Low),
        "mid" => Ok(EnergyLevel::Mid),
        "high" => Ok(EnergyLevel::High),
        "unset" => Ok(EnergyLevel::Unset),
        other => Err(format!(
            "unknown energy level '{other}' (expected low, mid, high, or unset)"
        )),
    }
}

/// Build a context key from CLI arguments.
pub fn context(task: &str, energy: &str) -> Result<ContextKey, Box<dyn std::error::Error>> {
    Ok(ContextKey::new(task, parse_energy(energy)?))
}

/// Open the engine against the on-disk store and session log.
pub fn open_engine() -> Result<RecommendationEngine, Box<dyn std::error::Error>> {
    let config = EngineConfig::load_or_default();
    let store = SqliteStateStore::open()?;
    let log = SessionLog::open()?;
    Ok(RecommendationEngine::new(config, Box::new(store)).with_session_log(log))
}

/// Parse a comma-separated list of custom durations.
pub fn parse_arms(arms: Option<&str>) -> Result<Vec<u32>, Box<dyn std::error::Error>> {
    match arms {
        None => Ok(Vec::new()),
        Some(list) => list
            .split(',')
            .map(|s| s.trim().parse::<u32>().map_err(Into::into))
            .collect(),
    }
}
