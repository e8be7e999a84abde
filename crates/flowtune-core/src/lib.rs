//! # Flowtune Core Library
//!
//! This library provides the adaptive recommendation engine for Flowtune:
//! it suggests a focus-session duration (and a matching break) for a single
//! user, personalizing over time from that user's own completed and
//! abandoned sessions. The CLI binary is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Engine**: the orchestrator composing the heuristic baseline, the
//!   bootstrap behavior average, Thompson Sampling, capacity adjustment,
//!   the cross-energy floor, guardrails, and zone clamping
//! - **Bandit**: Beta-posterior arms per (context, action) with a seedable
//!   sampler
//! - **Zones**: duration bands with overlapping action tables and
//!   hysteresis-based transitions
//! - **Capacity**: rolling window of recent outcomes with completion rate
//!   and trend
//! - **Storage**: SQLite session log plus namespaced key-value state,
//!   behind an injectable trait
//!
//! ## Key Components
//!
//! - [`RecommendationEngine`]: entry point for recommendations and updates
//! - [`ContextKey`]: the (task type, energy level) pair scoping all learning
//! - [`StateStore`]: durable namespaced map for learned state
//! - [`SessionLog`]: append-only outcome log with daily aggregates

pub mod bandit;
pub mod baseline;
pub mod capacity;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod guardrail;
pub mod reward;
pub mod storage;
pub mod util;
pub mod zone;

pub use bandit::{BetaParams, ContextArms, ThompsonSampler};
pub use baseline::{Baseline, BaselineProvider, StaticBaseline};
pub use capacity::{CapacityStats, SessionSample, Trend};
pub use config::EngineConfig;
pub use context::{ContextKey, EnergyLevel};
pub use engine::{
    Recommendation, RecommendationEngine, RecommendationSource, SessionOutcome, StateBundle,
};
pub use error::{ConfigError, EngineError, StorageError};
pub use reward::SkipReason;
pub use storage::{
    DailyAggregates, MemoryStateStore, OutcomeRecord, SessionLog, SqliteStateStore, StateStore,
};
pub use zone::{FocusZone, ZoneData};
