//! Bandit arms shared by the bandit-family experiments.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::mechanics::{control, stoch};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BanditArm {
    pub id: usize,
    pub mean_reward: f64,
    pub times_chosen: u32,
    pub total_reward: f64,
    pub available: bool,
}

impl BanditArm {
    pub fn new(id: usize, mean_reward: f64) -> Self {
        Self { id, mean_reward, times_chosen: 0, total_reward: 0.0, available: true }
    }

    pub fn record(&mut self, reward: f64) {
        self.times_chosen += 1;
        self.total_reward += reward;
    }

    /// Observed average, 0 before the first pull.
    pub fn average_reward(&self) -> f64 {
        if self.times_chosen == 0 { 0.0 } else { self.total_reward / f64::from(self.times_chosen) }
    }

    /// Random-walk the mean by `U(-half_width, half_width)` within `[lo, hi]`.
    pub fn drift<R: RngCore + ?Sized>(&mut self, rng: &mut R, half_width: f64, lo: f64, hi: f64) {
        self.mean_reward = control::drift(self.mean_reward, stoch::jitter(rng, half_width), lo, hi);
    }
}

/// `n` arms with means drawn from `U(lo, hi)`.
pub fn uniform_arms<R: RngCore + ?Sized>(rng: &mut R, n: usize, lo: f64, hi: f64) -> Vec<BanditArm> {
    (0..n).map(|id| BanditArm::new(id, stoch::uniform(rng, lo, hi))).collect()
}

/// Current means, `None` for withdrawn arms.
pub fn snapshot_means(arms: &[BanditArm]) -> Vec<Option<f64>> {
    arms.iter().map(|a| a.available.then_some(a.mean_reward)).collect()
}
