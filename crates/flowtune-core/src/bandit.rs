//! Per-context Thompson Sampling over duration arms.
//!
//! Each (context, action) pair carries a Beta(alpha, beta) belief in the
//! action's success probability. Selection samples every candidate's
//! posterior and takes the best draw; updates add the reward's success and
//! failure weights to alpha and beta. Confident positive outcomes get a
//! trust multiplier so proven winners consolidate faster than noise.

use std::collections::BTreeMap;

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

use crate::config::BanditConfig;

/// Beta-distribution belief for one arm. Invariant: both parameters > 0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BetaParams {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaParams {
    pub fn prior(cfg: &BanditConfig) -> Self {
        Self {
            alpha: cfg.prior_alpha,
            beta: cfg.prior_beta,
        }
    }

    /// Posterior mean of the success probability.
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Accumulated evidence weight, excluding the pseudo-count prior.
    pub fn evidence(&self, cfg: &BanditConfig) -> f64 {
        (self.alpha + self.beta) - (cfg.prior_alpha + cfg.prior_beta)
    }
}

/// All arms for one context, keyed by duration in minutes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContextArms {
    pub arms: BTreeMap<u32, BetaParams>,
}

impl ContextArms {
    /// Make sure every candidate action has initialized parameters.
    pub fn ensure_arms(&mut self, actions: &[u32], cfg: &BanditConfig) {
        for action in actions {
            self.arms.entry(*action).or_insert_with(|| BetaParams::prior(cfg));
        }
    }

    /// Evidence summed over the given actions.
    pub fn total_observations(&self, actions: &[u32], cfg: &BanditConfig) -> f64 {
        actions
            .iter()
            .filter_map(|a| self.arms.get(a))
            .map(|p| p.evidence(cfg))
            .sum()
    }

    /// Arms with real evidence, for the cross-energy floor.
    pub fn proven_arms(&self, cfg: &BanditConfig) -> Vec<(u32, BetaParams)> {
        self.arms
            .iter()
            .filter(|(_, p)| p.evidence(cfg) >= 1.0 && p.mean() >= 0.5)
            .map(|(a, p)| (*a, *p))
            .collect()
    }
}

/// Thompson Sampling selector with a seedable generator.
pub struct ThompsonSampler {
    cfg: BanditConfig,
    rng: Mcg128Xsl64,
}

impl ThompsonSampler {
    pub fn new(cfg: BanditConfig) -> Self {
        let rng = match cfg.seed {
            Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
            None => Mcg128Xsl64::from_entropy(),
        };
        Self { cfg, rng }
    }

    pub fn config(&self) -> &BanditConfig {
        &self.cfg
    }

    /// Approximate Beta(alpha, beta) draw from two independent uniforms:
    /// `u^(1/alpha) / (u^(1/alpha) + v^(1/beta))`. Biased for parameters
    /// below 1, which the priors here never produce.
    fn sample_beta(&mut self, alpha: f64, beta: f64) -> f64 {
        let u: f64 = self.rng.gen::<f64>().max(f64::MIN_POSITIVE);
        let v: f64 = self.rng.gen::<f64>().max(f64::MIN_POSITIVE);
        let x = u.powf(1.0 / alpha);
        let y = v.powf(1.0 / beta);
        x / (x + y)
    }

    /// Pick an action for the context.
    ///
    /// With fewer than two observations' worth of evidence the pick is
    /// uniformly random among the candidates, ignoring the priors, so the
    /// first data points spread across the action space. Afterwards,
    /// classic Thompson Sampling.
    pub fn select_action(&mut self, arms: &mut ContextArms, actions: &[u32]) -> Option<u32> {
        if actions.is_empty() {
            return None;
        }
        arms.ensure_arms(actions, &self.cfg);

        let total = arms.total_observations(actions, &self.cfg);
        if total < self.cfg.cold_start_observations {
            let idx = self.rng.gen_range(0..actions.len());
            return Some(actions[idx]);
        }

        let mut best = actions[0];
        let mut best_sample = f64::NEG_INFINITY;
        for action in actions {
            let params = arms.arms[action];
            let sample = self.sample_beta(params.alpha, params.beta);
            if sample > best_sample {
                best_sample = sample;
                best = *action;
            }
        }
        Some(best)
    }

    /// Bayesian update for one arm.
    ///
    /// A reward of exactly 0 or NaN carries no signal and is skipped.
    /// Rewards above the trust threshold weigh in at 1.5x.
    pub fn update_model(&mut self, arms: &mut ContextArms, action: u32, reward: f64) {
        if reward == 0.0 || reward.is_nan() {
            return;
        }
        let params = arms
            .arms
            .entry(action)
            .or_insert_with(|| BetaParams::prior(&self.cfg));

        let success = reward.clamp(0.0, 1.0);
        let failure = 1.0 - success;
        let trust = if reward > self.cfg.trust_threshold {
            self.cfg.trust_multiplier
        } else {
            1.0
        };
        params.alpha += success * trust;
        params.beta += failure * trust;
    }

    /// Synthetic negative update when the user declines a recommendation.
    /// Distinct from a failed session: the arm was never even attempted.
    pub fn penalize_rejection(&mut self, arms: &mut ContextArms, action: u32) {
        let reward = self.cfg.rejection_reward;
        self.update_model(arms, action, reward);
    }
}
