//! TOML-based engine configuration.
//!
//! Tuning knobs for the recommendation engine:
//! - Beta prior and trust weighting for the bandit
//! - Bootstrap and cold-start observation thresholds
//! - Capacity stretch thresholds and spillover settings
//! - Global and short-mode duration bounds
//!
//! Configuration is stored at `~/.config/flowtune/flowtune.toml`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::storage::data_dir;

/// Bandit-specific configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BanditConfig {
    /// Prior alpha for unexplored arms.
    #[serde(default = "default_prior_alpha")]
    pub prior_alpha: f64,
    /// Prior beta for unexplored arms. 1.5 gives a pessimistic prior
    /// (mean 0.4) so random noise cannot beat a proven winner.
    #[serde(default = "default_prior_beta")]
    pub prior_beta: f64,
    /// Evidence below which arm selection is uniformly random.
    #[serde(default = "default_cold_start_observations")]
    pub cold_start_observations: f64,
    /// Multiplier applied to both update weights for confident outcomes.
    #[serde(default = "default_trust_multiplier")]
    pub trust_multiplier: f64,
    /// Reward above which the trust multiplier applies.
    #[serde(default = "default_trust_threshold")]
    pub trust_threshold: f64,
    /// Synthetic reward recorded when the user declines a recommendation.
    #[serde(default = "default_rejection_reward")]
    pub rejection_reward: f64,
    /// Fixed RNG seed for reproducible sampling (tests, debugging).
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Orchestrator configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RecommendConfig {
    /// Evidence below which the engine mirrors recent behavior (EWMA)
    /// instead of sampling the bandit.
    #[serde(default = "default_bootstrap_observations")]
    pub bootstrap_observations: f64,
    /// EWMA weight on the newest selected duration.
    #[serde(default = "default_ewma_weight")]
    pub ewma_weight: f64,
    /// Fraction of a strong session's reward credited to the next-higher arm.
    #[serde(default = "default_spillover_factor")]
    pub spillover_factor: f64,
    /// Scaled reward at or above which spillover fires.
    #[serde(default = "default_spillover_threshold")]
    pub spillover_threshold: f64,
    /// Global recommendation bounds during bootstrap (minutes).
    #[serde(default = "default_min_minutes")]
    pub min_minutes: u32,
    #[serde(default = "default_max_minutes")]
    pub max_minutes: u32,
    /// Bounds when the caller requests a short session.
    #[serde(default = "default_short_min_minutes")]
    pub short_min_minutes: u32,
    #[serde(default = "default_short_max_minutes")]
    pub short_max_minutes: u32,
}

/// Capacity adjustment configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CapacityConfig {
    /// Completion rate below which the model is overridden with reality.
    #[serde(default = "default_override_completion_rate")]
    pub override_completion_rate: f64,
    /// Completion rate required for a stretch nudge at high energy.
    #[serde(default = "default_stretch_rate_high")]
    pub stretch_rate_high: f64,
    /// Completion rate required for a stretch nudge at mid (or unset) energy.
    #[serde(default = "default_stretch_rate_mid")]
    pub stretch_rate_mid: f64,
    /// Minutes added by a stretch nudge.
    #[serde(default = "default_stretch_step")]
    pub stretch_step: u32,
}

/// Guardrail configuration over daily session-log aggregates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GuardrailConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Daily focused minutes at which recommendations cap at `overload_cap`.
    #[serde(default = "default_daily_load_minutes")]
    pub daily_load_minutes: u32,
    #[serde(default = "default_overload_cap")]
    pub overload_cap: u32,
    /// Idle days after which re-entry caps at `reentry_cap`.
    #[serde(default = "default_reentry_idle_days")]
    pub reentry_idle_days: u32,
    #[serde(default = "default_reentry_cap")]
    pub reentry_cap: u32,
}

/// Engine configuration.
///
/// Serialized to/from TOML at `~/.config/flowtune/flowtune.toml`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub bandit: BanditConfig,
    #[serde(default)]
    pub recommend: RecommendConfig,
    #[serde(default)]
    pub capacity: CapacityConfig,
    #[serde(default)]
    pub guardrail: GuardrailConfig,
}

// Default functions
fn default_prior_alpha() -> f64 {
    1.0
}
fn default_prior_beta() -> f64 {
    1.5
}
fn default_cold_start_observations() -> f64 {
    2.0
}
fn default_trust_multiplier() -> f64 {
    1.5
}
fn default_trust_threshold() -> f64 {
    0.7
}
fn default_rejection_reward() -> f64 {
    -0.3
}
fn default_bootstrap_observations() -> f64 {
    5.0
}
fn default_ewma_weight() -> f64 {
    0.7
}
fn default_spillover_factor() -> f64 {
    0.25
}
fn default_spillover_threshold() -> f64 {
    0.7
}
fn default_min_minutes() -> u32 {
    10
}
fn default_max_minutes() -> u32 {
    120
}
fn default_short_min_minutes() -> u32 {
    10
}
fn default_short_max_minutes() -> u32 {
    30
}
fn default_override_completion_rate() -> f64 {
    0.5
}
fn default_stretch_rate_high() -> f64 {
    0.85
}
fn default_stretch_rate_mid() -> f64 {
    0.95
}
fn default_stretch_step() -> u32 {
    5
}
fn default_true() -> bool {
    true
}
fn default_daily_load_minutes() -> u32 {
    300
}
fn default_overload_cap() -> u32 {
    25
}
fn default_reentry_idle_days() -> u32 {
    3
}
fn default_reentry_cap() -> u32 {
    30
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            prior_alpha: default_prior_alpha(),
            prior_beta: default_prior_beta(),
            cold_start_observations: default_cold_start_observations(),
            trust_multiplier: default_trust_multiplier(),
            trust_threshold: default_trust_threshold(),
            rejection_reward: default_rejection_reward(),
            seed: None,
        }
    }
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            bootstrap_observations: default_bootstrap_observations(),
            ewma_weight: default_ewma_weight(),
            spillover_factor: default_spillover_factor(),
            spillover_threshold: default_spillover_threshold(),
            min_minutes: default_min_minutes(),
            max_minutes: default_max_minutes(),
            short_min_minutes: default_short_min_minutes(),
            short_max_minutes: default_short_max_minutes(),
        }
    }
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            override_completion_rate: default_override_completion_rate(),
            stretch_rate_high: default_stretch_rate_high(),
            stretch_rate_mid: default_stretch_rate_mid(),
            stretch_step: default_stretch_step(),
        }
    }
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_load_minutes: default_daily_load_minutes(),
            overload_cap: default_overload_cap(),
            reentry_idle_days: default_reentry_idle_days(),
            reentry_cap: default_reentry_cap(),
        }
    }
}

impl EngineConfig {
    fn path() -> Result<std::path::PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: std::path::PathBuf::from("~/.config/flowtune"),
            message: e.to_string(),
        })?;
        Ok(dir.join("flowtune.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string())),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("config load failed, using defaults: {e}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: EngineConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let parsed: EngineConfig = toml::from_str("[bandit]\nprior_beta = 2.0\n").unwrap();
        assert_eq!(parsed.bandit.prior_beta, 2.0);
        assert_eq!(parsed.bandit.prior_alpha, 1.0);
        assert_eq!(parsed.recommend.bootstrap_observations, 5.0);
        assert_eq!(parsed.guardrail.daily_load_minutes, 300);
    }
}
