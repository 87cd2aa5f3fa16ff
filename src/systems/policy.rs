//! Counterpart policies: simulated opponents for the two-party games and the
//! simulated agent of the bandit comparison.
//!
//! Each policy is a small value type selected by configuration and driven by
//! the history it is handed plus an injected RNG.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::mechanics::{control, split, stats, stoch};

/// Mirror the player's previous move; after a defection, cooperate anyway
/// with probability `forgiveness`. Cooperates on the first round.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TitForTat {
    pub forgiveness: f64,
}

impl Default for TitForTat {
    fn default() -> Self {
        Self { forgiveness: 0.2 }
    }
}

impl TitForTat {
    /// `true` = cooperate.
    pub fn decide<R: RngCore + ?Sized>(&self, player_last_cooperated: Option<bool>, rng: &mut R) -> bool {
        match player_last_cooperated {
            None | Some(true) => true,
            Some(false) => stoch::bernoulli(rng, self.forgiveness),
        }
    }
}

/// Play the primary action with `clamp(base + slope * rate, 0, 1)` where
/// `rate` is the player's historical primary-action rate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveRate {
    pub base: f64,
    pub slope: f64,
}

impl AdaptiveRate {
    pub fn probability(&self, player_rate: f64) -> f64 {
        control::adaptive_probability(self.base, self.slope, player_rate)
    }

    pub fn decide<R: RngCore + ?Sized>(&self, player_rate: f64, rng: &mut R) -> bool {
        stoch::bernoulli(rng, self.probability(player_rate))
    }
}

/// Responder rule: reject at or below `share * pot`, otherwise accept with
/// probability rising linearly to 1 at the full pot.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdAcceptance {
    pub share: f64,
}

impl Default for ThresholdAcceptance {
    fn default() -> Self {
        Self { share: 0.25 }
    }
}

impl ThresholdAcceptance {
    pub fn probability(&self, offer: f64, pot: f64) -> f64 {
        let threshold = self.share * pot;
        if offer <= threshold || pot <= threshold {
            0.0
        } else {
            ((offer - threshold) / (pot - threshold)).clamp(0.0, 1.0)
        }
    }

    pub fn decide<R: RngCore + ?Sized>(&self, offer: f64, pot: f64, rng: &mut R) -> bool {
        stoch::bernoulli(rng, self.probability(offer, pot))
    }
}

/// Uniform fraction of an amount in `[lo, hi)`, rounded to whole points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixedRange {
    pub lo: f64,
    pub hi: f64,
}

impl FixedRange {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    pub fn draw<R: RngCore + ?Sized>(&self, amount: f64, rng: &mut R) -> f64 {
        split::rounded_share(amount, stoch::uniform(rng, self.lo, self.hi))
    }
}

/// What a bandit strategy knows about one arm: its own pulls only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmStats {
    pub times_chosen: u32,
    pub total_reward: f64,
}

impl ArmStats {
    pub fn mean_or(&self, prior: f64) -> f64 {
        if self.times_chosen == 0 {
            prior
        } else {
            self.total_reward / f64::from(self.times_chosen)
        }
    }

    pub fn record(&mut self, reward: f64) {
        self.times_chosen += 1;
        self.total_reward += reward;
    }
}

/// Exploration strategies of the simulated bandit agent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BanditStrategy {
    /// Pull every arm once, then `argmax(mean + sqrt(2 ln t / n))`.
    #[default]
    Ucb,
    /// Explore with probability `epsilon0 * exp(-t / tau)`.
    EpsilonDecay { epsilon0: f64, tau: f64 },
    /// Boltzmann sampling with temperature `t0 * exp(-t / tau)`.
    Softmax { t0: f64, tau: f64, prior: f64 },
    /// Constant exploration rate.
    EpsilonGreedy { epsilon: f64 },
}

impl BanditStrategy {
    /// Strategy behind an agent label. Unknown labels get plain ε-greedy.
    pub fn from_label(label: &str) -> Self {
        match label {
            "gpt-4" => Self::Ucb,
            "claude-3" => Self::EpsilonDecay { epsilon0: 0.1, tau: 50.0 },
            "gemini-pro" => Self::Softmax { t0: 1.0, tau: 100.0, prior: 30.0 },
            _ => Self::EpsilonGreedy { epsilon: 0.1 },
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Self::Ucb => "upper confidence bound: balances exploration and exploitation by uncertainty",
            Self::EpsilonDecay { .. } => "conservative epsilon-greedy with exploration decaying over time",
            Self::Softmax { .. } => "softmax exploration sampling from a Boltzmann distribution",
            Self::EpsilonGreedy { .. } => "standard epsilon-greedy",
        }
    }

    /// Pick an arm for 0-based trial `t`. `arms` must be non-empty.
    pub fn choose<R: RngCore + ?Sized>(&self, arms: &[ArmStats], t: usize, rng: &mut R) -> usize {
        if arms.is_empty() {
            return 0;
        }
        let t = t as f64;
        match *self {
            Self::Ucb => {
                if let Some(i) = arms.iter().position(|a| a.times_chosen == 0) {
                    return i;
                }
                let bonus_num = 2.0 * (t + 1.0).ln();
                let scores: Vec<f64> = arms
                    .iter()
                    .map(|a| a.mean_or(0.0) + (bonus_num / f64::from(a.times_chosen)).sqrt())
                    .collect();
                stats::argmax(&scores).unwrap_or(0)
            }
            Self::EpsilonDecay { epsilon0, tau } => {
                epsilon_greedy(arms, epsilon0 * (-t / tau).exp(), rng)
            }
            Self::EpsilonGreedy { epsilon } => epsilon_greedy(arms, epsilon, rng),
            Self::Softmax { t0, tau, prior } => {
                let temp = (t0 * (-t / tau).exp()).max(f64::MIN_POSITIVE);
                let logits: Vec<f64> = arms.iter().map(|a| a.mean_or(prior) / temp).collect();
                let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let weights: Vec<f64> = logits.iter().map(|l| (l - max).exp()).collect();
                stoch::weighted_index(rng, &weights)
            }
        }
    }
}

fn epsilon_greedy<R: RngCore + ?Sized>(arms: &[ArmStats], epsilon: f64, rng: &mut R) -> usize {
    if stoch::bernoulli(rng, epsilon) {
        stoch::index(rng, arms.len())
    } else {
        let means: Vec<f64> = arms.iter().map(|a| a.mean_or(0.0)).collect();
        stats::argmax(&means).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;

    fn arm(n: u32, total: f64) -> ArmStats {
        ArmStats { times_chosen: n, total_reward: total }
    }

    #[test]
    fn tit_for_tat_cooperates_first_and_after_cooperation() {
        let mut rng = seeded_rng(1);
        let p = TitForTat::default();
        for _ in 0..100 {
            assert!(p.decide(None, &mut rng));
            assert!(p.decide(Some(true), &mut rng));
        }
        let forgiven = (0..10_000).filter(|_| p.decide(Some(false), &mut rng)).count();
        assert!((1_700..2_300).contains(&forgiven), "forgiven {forgiven}");
    }

    #[test]
    fn threshold_acceptance_probabilities() {
        let r = ThresholdAcceptance::default();
        assert_eq!(r.probability(20.0, 100.0), 0.0);
        assert_eq!(r.probability(25.0, 100.0), 0.0);
        assert_eq!(r.probability(62.5, 100.0), 0.5);
        assert_eq!(r.probability(100.0, 100.0), 1.0);
    }

    #[test]
    fn fixed_range_draws_whole_points_in_range() {
        let mut rng = seeded_rng(2);
        let offers = FixedRange::new(0.3, 0.5);
        for _ in 0..1_000 {
            let x = offers.draw(100.0, &mut rng);
            assert_eq!(x, x.round());
            assert!((30.0..=50.0).contains(&x), "offer {x}");
        }
    }

    #[test]
    fn ucb_prefers_unchosen_then_lowest_index() {
        let mut rng = seeded_rng(3);
        let s = BanditStrategy::Ucb;
        let arms = [arm(5, 400.0), arm(0, 0.0), arm(0, 0.0), arm(1, 100.0)];
        assert_eq!(s.choose(&arms, 6, &mut rng), 1);
        let tied = [arm(3, 150.0), arm(3, 150.0)];
        assert_eq!(s.choose(&tied, 6, &mut rng), 0);
    }

    #[test]
    fn labels_map_to_strategies() {
        assert_eq!(BanditStrategy::from_label("gpt-4"), BanditStrategy::Ucb);
        assert!(matches!(BanditStrategy::from_label("claude-3"), BanditStrategy::EpsilonDecay { .. }));
        assert!(matches!(BanditStrategy::from_label("gemini-pro"), BanditStrategy::Softmax { .. }));
        assert_eq!(
            BanditStrategy::from_label("other"),
            BanditStrategy::EpsilonGreedy { epsilon: 0.1 }
        );
    }

    #[test]
    fn late_softmax_is_greedy_and_finite() {
        let mut rng = seeded_rng(4);
        let s = BanditStrategy::from_label("gemini-pro");
        let arms = [arm(10, 400.0), arm(10, 700.0), arm(0, 0.0)];
        for _ in 0..200 {
            assert_eq!(s.choose(&arms, 299, &mut rng), 1);
        }
    }
}
