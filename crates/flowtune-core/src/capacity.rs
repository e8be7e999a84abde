//! Rolling capacity statistics per context.
//!
//! Capacity is the empirically observed sustainable focus duration: a
//! bounded window of recent outcomes, the average achieved duration, the
//! completion rate, and a trend estimated from the slope of achieved/selected
//! ratios. The adjustment step uses these to pull an over-eager model back
//! to reality or to nudge a consistently-completing user upward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::CapacityConfig;
use crate::context::EnergyLevel;
use crate::util::round5;

/// Sessions retained in the rolling window.
const CAPACITY_WINDOW: usize = 10;

/// Points used for the trend regression.
const TREND_POINTS: usize = 5;

/// Minimum samples before capacity has any say.
const MIN_SAMPLES: usize = 3;

/// One finished session as seen by the capacity tracker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSample {
    /// Duration the user committed to (minutes)
    pub selected_duration: u32,
    /// Focus time actually achieved (minutes)
    pub actual_focus_min: u32,
    /// Whether the session ran to completion
    pub completed: bool,
    pub timestamp: DateTime<Utc>,
}

/// Direction the achieved/selected ratio is moving.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Growing,
    Stable,
    Declining,
}

/// Rolling capacity state for one context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapacityStats {
    /// Recent outcomes, newest last, at most 10
    pub recent_sessions: Vec<SessionSample>,
    /// Mean achieved focus time over the window (minutes)
    pub average_capacity: f64,
    /// Fraction of windowed sessions that completed
    pub completion_rate: f64,
    pub trend: Trend,
}

impl Default for CapacityStats {
    fn default() -> Self {
        Self {
            recent_sessions: Vec::new(),
            average_capacity: 0.0,
            completion_rate: 0.0,
            trend: Trend::Stable,
        }
    }
}

impl CapacityStats {
    pub fn sample_count(&self) -> usize {
        self.recent_sessions.len()
    }

    /// Whether enough history exists for capacity to influence decisions.
    pub fn has_signal(&self) -> bool {
        self.sample_count() >= MIN_SAMPLES
    }

    /// Selected durations in window order, for the bootstrap average.
    pub fn selected_durations(&self) -> Vec<u32> {
        self.recent_sessions
            .iter()
            .map(|s| s.selected_duration)
            .collect()
    }
}

/// Fold a finished session into the stats and recompute the aggregates.
pub fn update_capacity_stats(stats: &mut CapacityStats, sample: SessionSample) {
    stats.recent_sessions.push(sample);
    if stats.recent_sessions.len() > CAPACITY_WINDOW {
        let excess = stats.recent_sessions.len() - CAPACITY_WINDOW;
        stats.recent_sessions.drain(..excess);
    }

    let n = stats.recent_sessions.len() as f64;
    stats.average_capacity = stats
        .recent_sessions
        .iter()
        .map(|s| s.actual_focus_min as f64)
        .sum::<f64>()
        / n;
    stats.completion_rate =
        stats.recent_sessions.iter().filter(|s| s.completed).count() as f64 / n;
    stats.trend = compute_trend(&stats.recent_sessions);
}

/// Trend from the least-squares slope of achieved/selected ratios across the
/// last five sessions. Needs at least three points, otherwise stable.
fn compute_trend(sessions: &[SessionSample]) -> Trend {
    let start = sessions.len().saturating_sub(TREND_POINTS);
    let points: Vec<f64> = sessions[start..]
        .iter()
        .map(|s| {
            if s.selected_duration == 0 {
                0.0
            } else {
                s.actual_focus_min as f64 / s.selected_duration as f64
            }
        })
        .collect();

    if points.len() < MIN_SAMPLES {
        return Trend::Stable;
    }

    let n = points.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = points.iter().sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in points.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    let slope = if den == 0.0 { 0.0 } else { num / den };

    if slope > 0.05 {
        Trend::Growing
    } else if slope < -0.05 {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Reconcile a model recommendation with proven capacity.
///
/// With under three samples this is a no-op. A failing completion rate
/// overrides the model with observed reality. Low energy never stretches:
/// the user's stated state wins over any streak. Otherwise a single
/// stretch step is added when the completion rate clears the per-energy
/// threshold and the trend is not declining.
pub fn adjust_for_capacity(
    model_rec: u32,
    stats: &CapacityStats,
    energy: EnergyLevel,
    cfg: &CapacityConfig,
) -> u32 {
    if !stats.has_signal() {
        return model_rec;
    }

    if stats.completion_rate < cfg.override_completion_rate {
        return round5(stats.average_capacity).max(10);
    }

    if energy == EnergyLevel::Low {
        return model_rec;
    }

    let threshold = match energy {
        EnergyLevel::High => cfg.stretch_rate_high,
        _ => cfg.stretch_rate_mid,
    };
    let trend_ok = matches!(stats.trend, Trend::Stable | Trend::Growing);
    if stats.completion_rate >= threshold && trend_ok {
        model_rec + cfg.stretch_step
    } else {
        model_rec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(selected: u32, actual: u32, completed: bool) -> SessionSample {
        SessionSample {
            selected_duration: selected,
            actual_focus_min: actual,
            completed,
            timestamp: Utc::now(),
        }
    }

    fn stats_from(samples: Vec<SessionSample>) -> CapacityStats {
        let mut stats = CapacityStats::default();
        for s in samples {
            update_capacity_stats(&mut stats, s);
        }
        stats
    }

    #[test]
    fn test_window_trims_to_ten() {
        let stats = stats_from((0..15).map(|_| sample(25, 25, true)).collect());
        assert_eq!(stats.sample_count(), 10);
        assert_eq!(stats.average_capacity, 25.0);
        assert_eq!(stats.completion_rate, 1.0);
    }

    #[test]
    fn test_trend_needs_three_points() {
        let stats = stats_from(vec![sample(25, 10, false), sample(25, 25, true)]);
        assert_eq!(stats.trend, Trend::Stable);
    }

    #[test]
    fn test_trend_growing_and_declining() {
        let growing = stats_from(vec![
            sample(50, 20, false),
            sample(50, 30, false),
            sample(50, 40, true),
            sample(50, 50, true),
            sample(50, 50, true),
        ]);
        assert_eq!(growing.trend, Trend::Growing);

        let declining = stats_from(vec![
            sample(50, 50, true),
            sample(50, 45, true),
            sample(50, 35, false),
            sample(50, 25, false),
            sample(50, 15, false),
        ]);
        assert_eq!(declining.trend, Trend::Declining);
    }

    #[test]
    fn test_adjust_noop_under_three_samples() {
        let cfg = CapacityConfig::default();
        let stats = stats_from(vec![sample(60, 10, false), sample(60, 10, false)]);
        assert_eq!(adjust_for_capacity(60, &stats, EnergyLevel::Mid, &cfg), 60);
    }

    #[test]
    fn test_adjust_overrides_with_reality_on_low_completion() {
        let cfg = CapacityConfig::default();
        let stats = stats_from(vec![
            sample(45, 12, false),
            sample(45, 12, true),
            sample(45, 12, false),
            sample(45, 12, false),
            sample(45, 12, false),
            sample(45, 12, false),
            sample(45, 12, false),
            sample(45, 12, false),
            sample(45, 12, false),
            sample(45, 12, false),
        ]);
        assert!(stats.completion_rate < 0.5);
        assert_eq!(stats.average_capacity, 12.0);
        // round5(12) = 10, floored at 10
        assert_eq!(adjust_for_capacity(90, &stats, EnergyLevel::High, &cfg), 10);
    }

    #[test]
    fn test_adjust_never_stretches_low_energy() {
        let cfg = CapacityConfig::default();
        let stats = stats_from((0..10).map(|_| sample(25, 25, true)).collect());
        assert_eq!(stats.completion_rate, 1.0);
        assert_eq!(adjust_for_capacity(25, &stats, EnergyLevel::Low, &cfg), 25);
    }

    #[test]
    fn test_adjust_stretch_thresholds_by_energy() {
        let cfg = CapacityConfig::default();
        // 9/10 completed: rate 0.9 clears high (0.85) but not mid (0.95).
        let mut samples: Vec<_> = (0..9).map(|_| sample(30, 30, true)).collect();
        samples.push(sample(30, 30, false));
        let stats = stats_from(samples);
        assert_eq!(adjust_for_capacity(30, &stats, EnergyLevel::High, &cfg), 35);
        assert_eq!(adjust_for_capacity(30, &stats, EnergyLevel::Mid, &cfg), 30);
        assert_eq!(adjust_for_capacity(30, &stats, EnergyLevel::Unset, &cfg), 30);
    }

    #[test]
    fn test_adjust_no_stretch_on_declining_trend() {
        let cfg = CapacityConfig::default();
        let stats = stats_from(vec![
            sample(30, 30, true),
            sample(30, 28, true),
            sample(30, 24, true),
            sample(30, 20, true),
            sample(30, 16, true),
        ]);
        assert_eq!(stats.completion_rate, 1.0);
        assert_eq!(stats.trend, Trend::Declining);
        assert_eq!(adjust_for_capacity(30, &stats, EnergyLevel::High, &cfg), 30);
    }
}
