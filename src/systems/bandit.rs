//! Classic four-armed bandit with stationary Gaussian arms.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::mechanics::{stats, stoch};
use crate::systems::arms::{self, BanditArm};
use crate::systems::sdk::{self, ChoiceRecord, Experiment, Meta, Progress, Slot, TrialContext};
use crate::{LabError, LabResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub trials: usize,
    pub arms: usize,
    pub mean_range: (f64, f64),
    pub sd_range: (f64, f64),
}

impl Default for Config {
    fn default() -> Self {
        Self { trials: 100, arms: 4, mean_range: (40.0, 80.0), sd_range: (10.0, 20.0) }
    }
}

/// One arm and its reward spread.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    #[serde(flatten)]
    pub arm: BanditArm,
    pub standard_deviation: f64,
}

impl Machine {
    /// `round(mean + sd * N(0,1))`, clamped to `[0, 100]`.
    pub fn pull<R: RngCore + ?Sized>(&self, rng: &mut R) -> f64 {
        stoch::gaussian(rng, self.arm.mean_reward, self.standard_deviation)
            .round()
            .clamp(0.0, 100.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pull {
    /// 1-based.
    pub bandit_id: usize,
    pub reward: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmSummary {
    pub id: usize,
    pub times_chosen: usize,
    pub total_reward: f64,
    pub average_reward: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_reward: f64,
    pub average_reward: f64,
    /// Distinct arms tried so far ÷ arm count.
    pub exploration_rate: f64,
    pub bandits: Vec<ArmSummary>,
}

#[derive(Clone, Debug, Default)]
pub struct MultiArmedBandit {
    pub cfg: Config,
}

impl MultiArmedBandit {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }
}

impl Experiment for MultiArmedBandit {
    type Trial = Slot;
    /// 0-based arm index.
    type Choice = usize;
    type Detail = Pull;
    type Env = Vec<Machine>;
    type Summary = Summary;

    fn meta(&self) -> Meta {
        Meta {
            slug: "multi-armed-bandit-task",
            name: "Multi-Armed Bandit Task",
            records_key: "trials",
            index_key: "trial",
            total_key: "totalTrials",
        }
    }

    fn total_trials(&self) -> usize {
        self.cfg.trials
    }

    fn generate_trials(&self, _rng: &mut dyn RngCore) -> Vec<Slot> {
        sdk::slots(self.cfg.trials)
    }

    fn init_env(&self, rng: &mut dyn RngCore) -> Vec<Machine> {
        let (lo, hi) = self.cfg.mean_range;
        let (sd_lo, sd_hi) = self.cfg.sd_range;
        arms::uniform_arms(rng, self.cfg.arms, lo, hi)
            .into_iter()
            .map(|mut arm| {
                arm.id += 1;
                Machine { arm, standard_deviation: stoch::uniform(rng, sd_lo, sd_hi) }
            })
            .collect()
    }

    fn act(
        &self,
        _trial: &Slot,
        machines: &mut Vec<Machine>,
        pick: usize,
        _ctx: &TrialContext<'_, Pull>,
        rng: &mut dyn RngCore,
    ) -> LabResult<Progress<Pull>> {
        let machine = machines
            .get_mut(pick)
            .ok_or_else(|| LabError::InvalidChoice(format!("no arm {pick}")))?;
        let reward = machine.pull(rng);
        machine.arm.record(reward);
        Ok(Progress::Complete { value: reward, detail: Pull { bandit_id: machine.arm.id, reward } })
    }

    fn summarize(&self, history: &[ChoiceRecord<Pull>]) -> Summary {
        let by_arm = stats::breakdown(history.iter().map(|r| (r.detail.bandit_id, r.detail.reward)));
        let bandits = (1..=self.cfg.arms)
            .map(|id| {
                let g = by_arm.get(&id).copied().unwrap_or_default();
                ArmSummary { id, times_chosen: g.count, total_reward: g.total, average_reward: g.mean }
            })
            .collect();
        let picks: Vec<usize> = history.iter().map(|r| r.detail.bandit_id - 1).collect();
        Summary {
            total_reward: history.iter().map(|r| r.detail.reward).sum(),
            average_reward: stats::mean_by(history, |r| r.detail.reward),
            exploration_rate: if picks.is_empty() {
                0.0
            } else {
                stats::exploration_rate(&picks, self.cfg.arms, picks.len(), 0)
            },
            bandits,
        }
    }
}
