//! Property tests for the reward pipeline: outputs stay in [0,1] for
//! arbitrary valid inputs, including extreme target durations.

use proptest::prelude::*;

use flowtune_core::reward::{
    apply_capacity_scaling, calculate_reward, RewardInput, SkipReason,
};

fn skip_reason_strategy() -> impl Strategy<Value = Option<SkipReason>> {
    prop_oneof![
        Just(None),
        Just(Some(SkipReason::SkippedFocus)),
        Just(Some(SkipReason::SkippedBreak)),
    ]
}

proptest! {
    #[test]
    fn reward_always_in_unit_interval(
        completed in any::<bool>(),
        accepted in any::<bool>(),
        focused in 0u32..=600,
        selected in 5u32..=300,
        recommended in 5u32..=300,
        skip in skip_reason_strategy(),
    ) {
        let reward = calculate_reward(&RewardInput {
            completed,
            accepted_recommendation: accepted,
            focused_minutes: focused,
            selected_duration: selected,
            recommended_duration: recommended,
            skip_reason: skip,
        });
        prop_assert!((0.0..=1.0).contains(&reward), "reward {reward} out of range");
        prop_assert!(reward.is_finite());
    }

    #[test]
    fn scaled_reward_always_in_unit_interval(
        base in 0.0f64..=1.0,
        duration in 0u32..=600,
        capacity in -10.0f64..=600.0,
    ) {
        let scaled = apply_capacity_scaling(base, duration, capacity);
        prop_assert!((0.0..=1.0).contains(&scaled), "scaled {scaled} out of range");
    }

    #[test]
    fn completed_sessions_never_score_below_skipped(
        focused in 1u32..=90,
        selected in 5u32..=90,
    ) {
        let done = calculate_reward(&RewardInput {
            completed: true,
            accepted_recommendation: false,
            focused_minutes: focused,
            selected_duration: selected,
            recommended_duration: selected,
            skip_reason: None,
        });
        let abandoned = calculate_reward(&RewardInput {
            completed: false,
            accepted_recommendation: false,
            focused_minutes: focused,
            selected_duration: selected,
            recommended_duration: selected,
            skip_reason: Some(SkipReason::SkippedFocus),
        });
        prop_assert!(done >= abandoned);
    }

    #[test]
    fn scaling_is_monotone_in_base_reward(
        lo in 0.0f64..=1.0,
        hi in 0.0f64..=1.0,
        duration in 1u32..=300,
        capacity in 1.0f64..=300.0,
    ) {
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
        let a = apply_capacity_scaling(lo, duration, capacity);
        let b = apply_capacity_scaling(hi, duration, capacity);
        prop_assert!(a <= b + 1e-12);
    }
}
