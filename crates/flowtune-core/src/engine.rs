//! Recommendation orchestrator.
//!
//! Composes the heuristic baseline, the bootstrap behavior average, the
//! bandit, capacity adjustment, the cross-energy floor, guardrails, and
//! zone clamping into a single duration. The contract is "always return a
//! duration": every storage failure on this path degrades to defaults and
//! is logged, never propagated.
//!
//! Write path per finished session, sequenced: reward -> capacity scaling
//! -> bandit update -> zone update -> spillover -> capacity update -> log
//! append. A crash mid-sequence loses at most the pending tail, never
//! corrupts prior state.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::bandit::{ContextArms, ThompsonSampler};
use crate::capacity::{adjust_for_capacity, update_capacity_stats, CapacityStats, SessionSample};
use crate::config::EngineConfig;
use crate::context::ContextKey;
use crate::error::{EngineError, StorageError};
use crate::guardrail::apply_guardrails;
use crate::reward::{apply_capacity_scaling, calculate_reward, RewardInput, SkipReason};
use crate::storage::{DailyAggregates, Namespace, OutcomeRecord, SessionLog, StateStore};
use crate::util::round5;
use crate::zone::{detect_zone, update_zone_data, zone_actions, FocusZone, ZoneData};

/// Fixed candidate set for break lengths, in minutes.
const BREAK_ACTIONS: [u32; 6] = [5, 10, 15, 20, 25, 30];

/// Observations required before the break bandit takes over from the
/// heuristic break.
const BREAK_MIN_OBSERVATIONS: f64 = 2.0;

/// Where a recommendation came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    /// Static baseline, no learned signal
    Heuristic,
    /// Bootstrap behavior average or bandit output
    Learned,
    /// Capacity adjustment changed the value
    Capacity,
    /// Cross-energy floor or zone clamp moved the value
    Blended,
}

/// A focus or break duration with its provenance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub minutes: u32,
    pub source: RecommendationSource,
}

/// One finished session reported back to the engine.
#[derive(Debug, Clone, Copy)]
pub struct SessionOutcome {
    /// Duration the user committed to (minutes)
    pub selected_min: u32,
    /// Focus time actually achieved (minutes)
    pub actual_focus_min: u32,
    pub completed: bool,
    /// Whether the user accepted the recommendation as-is
    pub accepted: bool,
    /// What the engine had recommended; defaults to the selection
    pub recommended_min: Option<u32>,
    pub skip_reason: Option<SkipReason>,
}

/// Portable snapshot of all three learned maps.
///
/// Missing sub-maps on import are simply not restored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StateBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandit: Option<BTreeMap<String, ContextArms>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zones: Option<BTreeMap<String, ZoneData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<BTreeMap<String, CapacityStats>>,
}

/// The adaptive recommendation engine.
///
/// Single-user and effectively single-threaded: one session is active at a
/// time, and callers guarantee each finished session is recorded exactly
/// once.
pub struct RecommendationEngine {
    config: EngineConfig,
    sampler: ThompsonSampler,
    store: Box<dyn StateStore>,
    log: Option<SessionLog>,
}

impl RecommendationEngine {
    pub fn new(config: EngineConfig, store: Box<dyn StateStore>) -> Self {
        let sampler = ThompsonSampler::new(config.bandit);
        Self {
            config,
            sampler,
            store,
            log: None,
        }
    }

    /// Attach a session log for outcome appends and guardrail aggregates.
    pub fn with_session_log(mut self, log: SessionLog) -> Self {
        self.log = Some(log);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Recommend a focus duration for the context.
    ///
    /// `heuristic` is the caller's baseline (static lookup); `dynamic_arms`
    /// are user-added custom durations; `short_flag` forces the short zone
    /// and its bounds.
    pub fn recommend(
        &mut self,
        ctx: &ContextKey,
        heuristic: u32,
        dynamic_arms: &[u32],
        short_flag: bool,
    ) -> Recommendation {
        let rc = self.config.recommend;
        let capacity = self.load_capacity(ctx).unwrap_or_default();
        let zone_data = self.zone_data_seeded(ctx, heuristic);

        let mut zone = if short_flag {
            FocusZone::Short
        } else {
            zone_data.zone
        };
        let mut actions = self.candidate_actions(zone, dynamic_arms, short_flag);

        let mut arms = self.load_arms(ctx).unwrap_or_default();
        let total_obs = arms.total_observations(&actions, self.sampler.config());

        // True cold start: nothing learned, nothing observed.
        if total_obs < 1.0 && capacity.sample_count() == 0 {
            return Recommendation {
                minutes: heuristic,
                source: RecommendationSource::Heuristic,
            };
        }

        let bootstrap = total_obs < rc.bootstrap_observations;
        let (mut minutes, mut source) = if bootstrap {
            // Mirror observed behavior instead of emitting uninformative
            // random suggestions while the bandit is still cold.
            match behavior_ewma(&capacity.selected_durations(), rc.ewma_weight) {
                Some(avg) => (round5(avg), RecommendationSource::Learned),
                None => (heuristic, RecommendationSource::Heuristic),
            }
        } else {
            // Enough evidence: let proven capacity pick the zone, then sample.
            if capacity.has_signal() && !short_flag {
                let corrected = detect_zone(round5(capacity.average_capacity), ctx.energy);
                if corrected != zone {
                    zone = corrected;
                    actions = self.candidate_actions(zone, dynamic_arms, short_flag);
                }
            }
            let pick = self
                .sampler
                .select_action(&mut arms, &actions)
                .unwrap_or(heuristic);
            (pick, RecommendationSource::Learned)
        };

        let adjusted = adjust_for_capacity(minutes, &capacity, ctx.energy, &self.config.capacity);
        if adjusted != minutes {
            minutes = adjusted;
            source = RecommendationSource::Capacity;
        }

        let mut floor_raised = false;
        if let Some(floor) = self.cross_energy_floor(ctx) {
            if floor > minutes {
                minutes = floor;
                floor_raised = true;
                if source != RecommendationSource::Capacity {
                    source = RecommendationSource::Blended;
                }
            }
        }

        // Bootstrap clamps to the global bounds; a warmed-up bandit clamps
        // into its own action set. A cross-energy floor widens the upper
        // bound (what was proven at lower energy stays reachable), except
        // under the short flag whose bounds are hard.
        let (lo, mut hi) = if short_flag {
            (rc.short_min_minutes, rc.short_max_minutes)
        } else if bootstrap {
            (rc.min_minutes, rc.max_minutes)
        } else {
            let lo = actions.first().copied().unwrap_or(rc.min_minutes);
            let hi = actions.last().copied().unwrap_or(rc.max_minutes);
            (lo, hi)
        };
        if floor_raised && !short_flag {
            hi = hi.max(minutes);
        }
        let clamped = minutes.clamp(lo, hi);
        if clamped != minutes && source == RecommendationSource::Learned {
            source = RecommendationSource::Blended;
        }
        minutes = clamped;

        minutes = apply_guardrails(minutes, &self.aggregates(), &self.config.guardrail);

        Recommendation {
            minutes: round5(minutes as f64).min(hi),
            source,
        }
    }

    /// Recommend a break length after `focus_minutes` of focus.
    ///
    /// Breaks cap at one-third of the focus duration (floor 5). The break
    /// bandit lives in a derived context so break arms never mix with
    /// focus arms.
    pub fn recommend_break(
        &mut self,
        ctx: &ContextKey,
        base_break: u32,
        focus_minutes: u32,
    ) -> Recommendation {
        let cap = (focus_minutes / 3).max(5);
        let candidates: Vec<u32> = BREAK_ACTIONS.iter().copied().filter(|a| *a <= cap).collect();
        // The 5-minute arm always survives the cap.
        let lo = candidates.first().copied().unwrap_or(BREAK_ACTIONS[0]);
        let hi = candidates.last().copied().unwrap_or(BREAK_ACTIONS[0]);

        let break_ctx = ctx.break_context();
        let mut arms = self.load_arms(&break_ctx).unwrap_or_default();
        let total_obs = arms.total_observations(&candidates, self.sampler.config());

        if total_obs < BREAK_MIN_OBSERVATIONS {
            return Recommendation {
                minutes: round5(base_break.clamp(lo, hi) as f64),
                source: RecommendationSource::Heuristic,
            };
        }

        let minutes = self
            .sampler
            .select_action(&mut arms, &candidates)
            .unwrap_or(base_break)
            .clamp(lo, hi);
        Recommendation {
            minutes,
            source: RecommendationSource::Learned,
        }
    }

    /// Fold one finished focus session into all learned state.
    ///
    /// Fail-soft: each stage logs and continues on storage errors so a
    /// partial failure degrades rather than corrupts.
    pub fn record_outcome(&mut self, ctx: &ContextKey, outcome: SessionOutcome) {
        let recommended = outcome.recommended_min.unwrap_or(outcome.selected_min);
        let reward = calculate_reward(&RewardInput {
            completed: outcome.completed,
            accepted_recommendation: outcome.accepted,
            focused_minutes: outcome.actual_focus_min,
            selected_duration: outcome.selected_min,
            recommended_duration: recommended,
            skip_reason: outcome.skip_reason,
        });

        let mut capacity = self.load_capacity(ctx).unwrap_or_default();
        let scaled = apply_capacity_scaling(
            reward,
            outcome.actual_focus_min,
            capacity.average_capacity,
        );

        // Bandit credit goes to the duration the user actually committed to.
        let mut arms = self.load_arms(ctx).unwrap_or_default();
        self.sampler.update_model(&mut arms, outcome.selected_min, scaled);

        // Zone follows achieved focus, not intent.
        let mut zone_data = self.zone_data_seeded(ctx, outcome.selected_min);
        update_zone_data(&mut zone_data, outcome.actual_focus_min);

        // Spillover: a strong completed session warms up the next-longer
        // arm so progress is not gated on direct trials of every action.
        if outcome.completed && scaled >= self.config.recommend.spillover_threshold {
            let ladder = zone_actions(zone_data.zone, &[]);
            if let Some(next) = ladder.iter().copied().find(|a| *a > outcome.selected_min) {
                let credit = scaled * self.config.recommend.spillover_factor;
                self.sampler.update_model(&mut arms, next, credit);
            }
        }

        update_capacity_stats(
            &mut capacity,
            SessionSample {
                selected_duration: outcome.selected_min,
                actual_focus_min: outcome.actual_focus_min,
                completed: outcome.completed,
                timestamp: Utc::now(),
            },
        );

        self.save_arms(ctx, &arms);
        self.save_zone(ctx, &zone_data);
        self.save_capacity(ctx, &capacity);

        if let Some(log) = &self.log {
            let record = OutcomeRecord {
                id: Uuid::new_v4(),
                task_type: ctx.task_type.clone(),
                energy: ctx.energy,
                selected_min: outcome.selected_min,
                recommended_min: recommended,
                actual_focus_min: outcome.actual_focus_min,
                completed: outcome.completed,
                accepted: outcome.accepted,
                skip_reason: outcome.skip_reason,
                recorded_at: Utc::now(),
            };
            if let Err(e) = log.append(&record) {
                warn!("session log append failed: {e}");
            }
        }
    }

    /// Fold one finished break into the break bandit.
    pub fn record_break_outcome(
        &mut self,
        ctx: &ContextKey,
        selected_break: u32,
        completed: bool,
        accepted: bool,
    ) {
        let reward = calculate_reward(&RewardInput {
            completed,
            accepted_recommendation: accepted,
            focused_minutes: if completed { selected_break } else { 0 },
            selected_duration: selected_break,
            recommended_duration: selected_break,
            skip_reason: if completed {
                None
            } else {
                Some(SkipReason::SkippedBreak)
            },
        });
        let break_ctx = ctx.break_context();
        let mut arms = self.load_arms(&break_ctx).unwrap_or_default();
        self.sampler.update_model(&mut arms, selected_break, reward);
        self.save_arms(&break_ctx, &arms);
    }

    /// Synthetic negative signal when the user declines a recommendation
    /// without running it.
    pub fn record_rejection(&mut self, ctx: &ContextKey, action: u32) {
        let mut arms = self.load_arms(ctx).unwrap_or_default();
        self.sampler.penalize_rejection(&mut arms, action);
        self.save_arms(ctx, &arms);
    }

    /// Bundle all three learned maps for backup.
    pub fn export_state(&self) -> Result<StateBundle, EngineError> {
        Ok(StateBundle {
            bandit: Some(self.export_namespace::<ContextArms>(Namespace::Bandit)?),
            zones: Some(self.export_namespace::<ZoneData>(Namespace::Zone)?),
            capacity: Some(self.export_namespace::<CapacityStats>(Namespace::Capacity)?),
        })
    }

    /// Restore a backup. Present sub-maps overwrite their namespace
    /// verbatim; missing sub-maps are left untouched.
    pub fn import_state(&mut self, bundle: StateBundle) -> Result<(), EngineError> {
        match bundle.bandit {
            Some(map) => self.import_namespace(Namespace::Bandit, &map)?,
            None => warn!("import: bandit map missing, not restored"),
        }
        match bundle.zones {
            Some(map) => self.import_namespace(Namespace::Zone, &map)?,
            None => warn!("import: zone map missing, not restored"),
        }
        match bundle.capacity {
            Some(map) => self.import_namespace(Namespace::Capacity, &map)?,
            None => warn!("import: capacity map missing, not restored"),
        }
        Ok(())
    }

    /// Drop all learned state. The only deletion path besides import.
    pub fn reset(&mut self) -> Result<(), EngineError> {
        for ns in Namespace::ALL {
            self.store.clear(ns)?;
        }
        Ok(())
    }

    // ---- internal helpers ----

    fn candidate_actions(&self, zone: FocusZone, dynamic_arms: &[u32], short_flag: bool) -> Vec<u32> {
        let rc = self.config.recommend;
        let mut actions = zone_actions(zone, dynamic_arms);
        if short_flag {
            actions.retain(|a| (rc.short_min_minutes..=rc.short_max_minutes).contains(a));
        }
        actions
    }

    /// Highest proven arm among strictly lower energy levels for the same
    /// task. A higher-energy recommendation never falls below what the
    /// user already achieved when tired.
    fn cross_energy_floor(&self, ctx: &ContextKey) -> Option<u32> {
        let mut floor = None;
        for lower in ctx.energy.lower_levels() {
            let arms = self.load_arms(&ctx.with_energy(*lower)).unwrap_or_default();
            let best = arms
                .proven_arms(self.sampler.config())
                .into_iter()
                .max_by(|a, b| {
                    a.1.mean()
                        .partial_cmp(&b.1.mean())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|(action, _)| action);
            if let Some(action) = best {
                floor = Some(floor.map_or(action, |f: u32| f.max(action)));
            }
        }
        floor
    }

    fn zone_data_seeded(&self, ctx: &ContextKey, seed_selection: u32) -> ZoneData {
        match self.load_zone(ctx) {
            Some(data) => data,
            None => {
                let data = ZoneData::seeded(seed_selection, ctx.energy);
                self.save_zone(ctx, &data);
                data
            }
        }
    }

    fn aggregates(&self) -> DailyAggregates {
        match &self.log {
            Some(log) => log.daily_aggregates(Utc::now()).unwrap_or_else(|e| {
                warn!("aggregate query failed, guardrails idle: {e}");
                DailyAggregates::default()
            }),
            None => DailyAggregates::default(),
        }
    }

    fn load_arms(&self, ctx: &ContextKey) -> Option<ContextArms> {
        self.load_json(Namespace::Bandit, ctx)
    }

    fn load_zone(&self, ctx: &ContextKey) -> Option<ZoneData> {
        self.load_json(Namespace::Zone, ctx)
    }

    fn load_capacity(&self, ctx: &ContextKey) -> Option<CapacityStats> {
        self.load_json(Namespace::Capacity, ctx)
    }

    fn load_json<T: serde::de::DeserializeOwned>(
        &self,
        ns: Namespace,
        ctx: &ContextKey,
    ) -> Option<T> {
        match self.store.get_json(ns, &ctx.storage_key()) {
            Ok(v) => v,
            Err(e) => {
                warn!("state read failed ({}/{}), using defaults: {e}", ns.as_str(), ctx.storage_key());
                None
            }
        }
    }

    fn save_arms(&self, ctx: &ContextKey, arms: &ContextArms) {
        self.save_json(Namespace::Bandit, ctx, arms);
    }

    fn save_zone(&self, ctx: &ContextKey, data: &ZoneData) {
        self.save_json(Namespace::Zone, ctx, data);
    }

    fn save_capacity(&self, ctx: &ContextKey, stats: &CapacityStats) {
        self.save_json(Namespace::Capacity, ctx, stats);
    }

    fn save_json<T: Serialize>(&self, ns: Namespace, ctx: &ContextKey, value: &T) {
        if let Err(e) = self.store.put_json(ns, &ctx.storage_key(), value) {
            warn!("state write failed ({}/{}): {e}", ns.as_str(), ctx.storage_key());
        }
    }

    fn export_namespace<T: serde::de::DeserializeOwned + Serialize>(
        &self,
        ns: Namespace,
    ) -> Result<BTreeMap<String, T>, EngineError> {
        let mut map = BTreeMap::new();
        for key in self.store.keys(ns)? {
            if let Some(value) = self.store.get_json::<T>(ns, &key)? {
                map.insert(key, value);
            }
        }
        Ok(map)
    }

    fn import_namespace<T: Serialize>(
        &mut self,
        ns: Namespace,
        map: &BTreeMap<String, T>,
    ) -> Result<(), StorageError> {
        self.store.clear(ns)?;
        for (key, value) in map {
            self.store.put_json(ns, key, value)?;
        }
        Ok(())
    }
}

/// Exponentially-weighted moving average with `weight` on the newest point.
/// Values arrive oldest first.
fn behavior_ewma(values: &[u32], weight: f64) -> Option<f64> {
    let mut iter = values.iter();
    let mut ewma = *iter.next()? as f64;
    for v in iter {
        ewma = weight * (*v as f64) + (1.0 - weight) * ewma;
    }
    Some(ewma)
}
