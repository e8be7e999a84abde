//! Static heuristic baseline, independent of learned state.
//!
//! Used as the cold-start fallback and as the initial zone seed. The table
//! keys off energy alone except that deep-work style tasks earn extra focus
//! at high energy.

use serde::{Deserialize, Serialize};

use crate::context::EnergyLevel;

/// A baseline focus/break pair in minutes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Baseline {
    pub focus_min: u32,
    pub break_min: u32,
}

/// Provider contract for the heuristic baseline.
pub trait BaselineProvider {
    fn baseline(&self, energy: EnergyLevel, task_type: &str, short_flag: bool) -> Baseline;
}

/// Built-in lookup table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticBaseline;

/// Task labels treated as deep work for the high-energy bonus.
const DEEP_WORK_TASKS: &[&str] = &["coding", "writing", "study", "research", "design"];

impl BaselineProvider for StaticBaseline {
    fn baseline(&self, energy: EnergyLevel, task_type: &str, short_flag: bool) -> Baseline {
        if short_flag {
            return Baseline {
                focus_min: 15,
                break_min: 5,
            };
        }
        let mut base = match energy {
            EnergyLevel::Low => Baseline {
                focus_min: 15,
                break_min: 5,
            },
            EnergyLevel::Mid | EnergyLevel::Unset => Baseline {
                focus_min: 25,
                break_min: 5,
            },
            EnergyLevel::High => Baseline {
                focus_min: 40,
                break_min: 10,
            },
        };
        if energy == EnergyLevel::High && DEEP_WORK_TASKS.contains(&task_type) {
            base.focus_min += 10;
        }
        base
    }
}
