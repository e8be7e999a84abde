//! Duration zones and hysteresis-based zone transitions.
//!
//! A zone is a named band of plausible focus durations with its own action
//! set. Zone boundaries deliberately overlap so a user drifting between
//! bands gets a smooth handoff rather than a cliff. Transitions require a
//! filled observation window and use asymmetric up/down thresholds to
//! prevent oscillation from one unusual session.

use serde::{Deserialize, Serialize};

use crate::context::EnergyLevel;

/// Maximum selections retained per context.
const SELECTION_WINDOW: usize = 10;

/// Selections required before a transition is considered.
const TRANSITION_MIN_SELECTIONS: usize = 5;

// Transition thresholds on the trailing five-selection average. The up and
// down edges of each pair differ; the gap between them is the hysteresis
// band that keeps a context from flapping between zones.
const SHORT_TO_LONG_AVG: f64 = 28.0;
const LONG_TO_SHORT_AVG: f64 = 25.0;
const LONG_TO_EXTENDED_AVG: f64 = 55.0;
const EXTENDED_TO_LONG_AVG: f64 = 55.0;

/// Preferred duration band for a context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FocusZone {
    /// Up to ~30 minutes
    Short,
    /// ~25-60 minutes
    Long,
    /// ~50-120 minutes
    Extended,
}

impl FocusZone {
    /// Fixed action table for this zone, in minutes.
    pub fn base_actions(&self) -> &'static [u32] {
        match self {
            FocusZone::Short => &[10, 15, 20, 25, 30],
            FocusZone::Long => &[25, 30, 35, 40, 45, 50, 55, 60],
            FocusZone::Extended => &[50, 60, 70, 80, 90, 105, 120],
        }
    }
}

/// Per-context zone state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ZoneData {
    /// Current duration band
    pub zone: FocusZone,
    /// How settled the zone is, `min(1, selections/5)`
    pub confidence: f64,
    /// Achieved durations, newest last, at most 10
    pub selections: Vec<u32>,
    /// Whether the window holds enough selections to evaluate a transition
    pub transition_ready: bool,
}

impl ZoneData {
    /// Seed zone state for a context from its first observed selection.
    pub fn seeded(selection: u32, energy: EnergyLevel) -> Self {
        Self {
            zone: detect_zone(selection, energy),
            confidence: 0.0,
            selections: Vec::new(),
            transition_ready: false,
        }
    }
}

/// Classify a single selection into a zone.
///
/// The 26-29 minute band is ambiguous; low energy resolves it downward.
pub fn detect_zone(selection: u32, energy: EnergyLevel) -> FocusZone {
    if selection <= 25 {
        FocusZone::Short
    } else if selection >= 70 {
        FocusZone::Extended
    } else if selection >= 30 {
        FocusZone::Long
    } else if energy == EnergyLevel::Low {
        FocusZone::Short
    } else {
        FocusZone::Long
    }
}

/// Candidate actions for a zone: sorted, de-duplicated union of the fixed
/// table and user-added custom durations.
pub fn zone_actions(zone: FocusZone, dynamic_arms: &[u32]) -> Vec<u32> {
    let mut actions: Vec<u32> = zone.base_actions().to_vec();
    actions.extend_from_slice(dynamic_arms);
    actions.sort_unstable();
    actions.dedup();
    actions
}

/// Evaluate whether the zone should transition, based on the average of the
/// last five achieved durations.
///
/// Returns the new zone, or `None` when the window is not full or no
/// threshold is crossed.
pub fn check_zone_transition(data: &ZoneData) -> Option<FocusZone> {
    if data.selections.len() < TRANSITION_MIN_SELECTIONS {
        return None;
    }
    let recent = &data.selections[data.selections.len() - TRANSITION_MIN_SELECTIONS..];
    let avg = recent.iter().map(|v| *v as f64).sum::<f64>() / recent.len() as f64;

    let next = match data.zone {
        FocusZone::Short if avg >= SHORT_TO_LONG_AVG => FocusZone::Long,
        FocusZone::Long if avg <= LONG_TO_SHORT_AVG => FocusZone::Short,
        FocusZone::Long if avg >= LONG_TO_EXTENDED_AVG => FocusZone::Extended,
        FocusZone::Extended if avg <= EXTENDED_TO_LONG_AVG => FocusZone::Long,
        _ => return None,
    };
    Some(next)
}

/// Fold a newly achieved duration into the zone state.
///
/// Appends to the selection window (trimmed to 10), recomputes confidence,
/// and applies a transition immediately when one is due. The selection
/// window is kept across transitions; the hysteresis gap prevents an
/// immediate bounce back.
pub fn update_zone_data(data: &mut ZoneData, achieved: u32) {
    data.selections.push(achieved);
    if data.selections.len() > SELECTION_WINDOW {
        let excess = data.selections.len() - SELECTION_WINDOW;
        data.selections.drain(..excess);
    }
    data.confidence =
        (data.selections.len() as f64 / TRANSITION_MIN_SELECTIONS as f64).min(1.0);
    data.transition_ready = data.selections.len() >= TRANSITION_MIN_SELECTIONS;

    if let Some(next) = check_zone_transition(data) {
        data.zone = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_zone_bands() {
        assert_eq!(detect_zone(25, EnergyLevel::Mid), FocusZone::Short);
        assert_eq!(detect_zone(30, EnergyLevel::Mid), FocusZone::Long);
        assert_eq!(detect_zone(69, EnergyLevel::Mid), FocusZone::Long);
        assert_eq!(detect_zone(70, EnergyLevel::Mid), FocusZone::Extended);
        assert_eq!(detect_zone(120, EnergyLevel::High), FocusZone::Extended);
    }

    #[test]
    fn test_detect_zone_ambiguous_band_resolves_by_energy() {
        for sel in 26..=29 {
            assert_eq!(detect_zone(sel, EnergyLevel::Low), FocusZone::Short);
            assert_eq!(detect_zone(sel, EnergyLevel::Mid), FocusZone::Long);
            assert_eq!(detect_zone(sel, EnergyLevel::High), FocusZone::Long);
            assert_eq!(detect_zone(sel, EnergyLevel::Unset), FocusZone::Long);
        }
    }

    #[test]
    fn test_zone_actions_merges_and_sorts() {
        let actions = zone_actions(FocusZone::Short, &[45, 15, 22]);
        assert_eq!(actions, vec![10, 15, 20, 22, 25, 30, 45]);
    }

    #[test]
    fn test_zone_actions_overlap_at_boundaries() {
        assert!(zone_actions(FocusZone::Short, &[]).contains(&25));
        assert!(zone_actions(FocusZone::Long, &[]).contains(&25));
        assert!(zone_actions(FocusZone::Long, &[]).contains(&60));
        assert!(zone_actions(FocusZone::Extended, &[]).contains(&60));
    }

    #[test]
    fn test_transition_requires_full_window() {
        let data = ZoneData {
            zone: FocusZone::Short,
            confidence: 0.8,
            selections: vec![40, 40, 40, 40],
            transition_ready: false,
        };
        assert_eq!(check_zone_transition(&data), None);
    }

    #[test]
    fn test_transition_short_to_long_hysteresis() {
        let mut data = ZoneData {
            zone: FocusZone::Short,
            confidence: 1.0,
            selections: vec![25, 28, 30, 26, 31],
            transition_ready: true,
        };
        assert_eq!(check_zone_transition(&data), Some(FocusZone::Long));

        data.selections = vec![15, 15, 20, 18, 12];
        assert_eq!(check_zone_transition(&data), None);

        // Inside the band a long zone never drops straight back to short.
        data.zone = FocusZone::Long;
        data.selections = vec![26, 27, 26, 28, 27];
        assert_eq!(check_zone_transition(&data), None);
    }

    #[test]
    fn test_transition_long_boundaries() {
        let mut data = ZoneData {
            zone: FocusZone::Long,
            confidence: 1.0,
            selections: vec![25, 25, 25, 25, 25],
            transition_ready: true,
        };
        assert_eq!(check_zone_transition(&data), Some(FocusZone::Short));

        data.selections = vec![55, 55, 55, 55, 55];
        assert_eq!(check_zone_transition(&data), Some(FocusZone::Extended));

        // Inside the hysteresis band: stays put.
        data.selections = vec![26, 30, 40, 50, 54];
        assert_eq!(check_zone_transition(&data), None);
    }

    #[test]
    fn test_update_zone_data_trims_and_transitions() {
        let mut data = ZoneData::seeded(20, EnergyLevel::Mid);
        assert_eq!(data.zone, FocusZone::Short);

        for achieved in [35, 35, 40, 35] {
            update_zone_data(&mut data, achieved);
            assert_eq!(data.zone, FocusZone::Short);
        }
        assert!(!data.transition_ready);

        update_zone_data(&mut data, 40);
        assert!(data.transition_ready);
        assert_eq!(data.zone, FocusZone::Long);
        assert_eq!(data.confidence, 1.0);

        for achieved in [30; 20] {
            update_zone_data(&mut data, achieved);
        }
        assert_eq!(data.selections.len(), 10);
    }
}
