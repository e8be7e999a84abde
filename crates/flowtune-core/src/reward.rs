//! Session outcome to scalar reward mapping.
//!
//! Rewards live in [0,1]. A completed session earns a high base tier plus a
//! ratio bonus for actually filling the target; abandoning during focus or
//! skipping the break land in lower tiers. Accepting the engine's
//! recommendation earns a flat bonus so the bandit learns acceptance, not
//! just completion. Very long targets take a small penalty to keep marathon
//! sessions from dominating.

use serde::{Deserialize, Serialize};

/// How a session ended short of full completion.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Abandoned during the focus phase
    SkippedFocus,
    /// Focus finished but the break was skipped
    SkippedBreak,
}

/// Inputs for reward calculation, one finished session.
#[derive(Debug, Clone, Copy)]
pub struct RewardInput {
    pub completed: bool,
    /// Whether the user accepted the engine's recommendation as-is
    pub accepted_recommendation: bool,
    /// Minutes of focus actually achieved
    pub focused_minutes: u32,
    /// Duration the user committed to
    pub selected_duration: u32,
    /// Duration the engine recommended
    pub recommended_duration: u32,
    pub skip_reason: Option<SkipReason>,
}

const ACCEPTANCE_BONUS: f64 = 0.15;

// Excess-duration penalty: grows linearly past this target, saturating at
// the cap.
const EXCESS_START_MIN: f64 = 90.0;
const EXCESS_CAP_MIN: f64 = 180.0;
const EXCESS_MAX_PENALTY: f64 = 0.1;

/// Map a session outcome to a reward in [0,1].
pub fn calculate_reward(input: &RewardInput) -> f64 {
    let target = if input.accepted_recommendation {
        input.recommended_duration
    } else {
        input.selected_duration
    };
    let target = target.max(1) as f64;
    let ratio = (input.focused_minutes as f64 / target).min(1.0);

    let bonus = if input.accepted_recommendation {
        ACCEPTANCE_BONUS
    } else {
        0.0
    };

    let base = if input.completed {
        0.7 + 0.3 * ratio
    } else {
        match input.skip_reason {
            Some(SkipReason::SkippedBreak) => 0.3 + 0.3 * ratio,
            // Abandoned focus, declared or not
            _ => 0.4 * ratio,
        }
    };

    let penalty = if target > EXCESS_START_MIN {
        let over = (target - EXCESS_START_MIN) / (EXCESS_CAP_MIN - EXCESS_START_MIN);
        EXCESS_MAX_PENALTY * over.min(1.0)
    } else {
        0.0
    };

    (base + bonus - penalty).clamp(0.0, 1.0)
}

/// Scale a reward by how the session compares to proven capacity.
///
/// Sessions far below capacity are damped so trivially easy wins cannot
/// dominate the bandit; genuine stretches above capacity earn a capped
/// boost. The band between is neutral.
pub fn apply_capacity_scaling(base_reward: f64, completed_duration: u32, average_capacity: f64) -> f64 {
    if average_capacity <= 0.0 {
        return base_reward;
    }
    let ratio = completed_duration as f64 / average_capacity;
    if ratio <= 0.7 {
        base_reward * 0.85
    } else if ratio >= 1.15 {
        (base_reward * 1.1).min(1.0)
    } else {
        base_reward
    }
}
