//! Daily-load and re-entry caps over session-log aggregates.
//!
//! These caps only ever lower a recommendation. A heavy day caps further
//! sessions at a recovery length; a multi-day gap caps the first session
//! back so re-entry starts small.

use crate::config::GuardrailConfig;
use crate::storage::DailyAggregates;

/// Apply guardrail caps to a focus recommendation.
pub fn apply_guardrails(minutes: u32, aggregates: &DailyAggregates, cfg: &GuardrailConfig) -> u32 {
    if !cfg.enabled {
        return minutes;
    }
    let mut capped = minutes;
    if aggregates.today_focus_min >= cfg.daily_load_minutes {
        capped = capped.min(cfg.overload_cap);
    }
    if let Some(days) = aggregates.days_since_last {
        if days >= cfg.reentry_idle_days as i64 {
            capped = capped.min(cfg.reentry_cap);
        }
    }
    capped
}
