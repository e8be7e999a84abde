//! Learned statistics inspection.

use clap::Subcommand;
use flowtune_core::storage::{Namespace, SqliteStateStore, StateStore};
use flowtune_core::{CapacityStats, ContextArms, SessionLog, ZoneData};

use super::context;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Zone, capacity, and arm state for one context
    Context {
        /// Task type label
        task: String,
        /// Energy level: low, mid, high, or unset
        #[arg(long, default_value = "unset")]
        energy: String,
    },
    /// Today's aggregates from the session log
    Today,
    /// All context keys with learned state
    Contexts,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStateStore::open()?;
    let store: &dyn StateStore = &store;

    match action {
        StatsAction::Context { task, energy } => {
            let key = context(&task, &energy)?.storage_key();
            let zone: Option<ZoneData> = store.get_json(Namespace::Zone, &key)?;
            let capacity: Option<CapacityStats> = store.get_json(Namespace::Capacity, &key)?;
            let arms: Option<ContextArms> = store.get_json(Namespace::Bandit, &key)?;
            let view = serde_json::json!({
                "context": key,
                "zone": zone,
                "capacity": capacity,
                "arms": arms,
            });
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        StatsAction::Today => {
            let log = SessionLog::open()?;
            let aggregates = log.daily_aggregates(chrono::Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&aggregates)?);
        }
        StatsAction::Contexts => {
            let mut keys = store.keys(Namespace::Bandit)?;
            for ns in [Namespace::Zone, Namespace::Capacity] {
                keys.extend(store.keys(ns)?);
            }
            keys.sort();
            keys.dedup();
            println!("{}", serde_json::to_string_pretty(&keys)?);
        }
    }
    Ok(())
}
