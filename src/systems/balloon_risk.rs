//! Balloon Analog Risk Task. Each pump banks points into a pending pot
//! and raises the chance of a pop; collecting moves the pot to the score.

use std::collections::BTreeMap;

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::mechanics::{hazard, stats};
use crate::systems::sdk::{self, ChoiceRecord, Experiment, Meta, Progress, TrialContext};
use crate::LabResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub trials: usize,
    pub points_per_pump: f64,
    /// Balloon tiers; each trial samples one uniformly.
    pub max_pumps: Vec<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self { trials: 30, points_per_pump: 10.0, max_pumps: vec![8, 16, 32] }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balloon {
    pub max_pumps: u32,
    pub points_per_pump: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Pump,
    Collect,
}

/// The balloon being inflated.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Inflation {
    pub pumps: u32,
    pub pending: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalloonResult {
    pub pumps: u32,
    pub max_pumps: u32,
    pub popped: bool,
    pub points: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierStats {
    pub count: usize,
    pub average_pumps: f64,
    pub pop_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub average_pumps: f64,
    /// Mean pumps over balloons that were collected, the usual risk score.
    pub adjusted_average_pumps: f64,
    pub pop_rate: f64,
    pub by_max_pumps: BTreeMap<u32, TierStats>,
}

#[derive(Clone, Debug, Default)]
pub struct BalloonRisk {
    pub cfg: Config,
}

impl BalloonRisk {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }
}

impl Experiment for BalloonRisk {
    type Trial = Balloon;
    type Choice = Action;
    type Detail = BalloonResult;
    type Env = Inflation;
    type Summary = Summary;

    fn meta(&self) -> Meta {
        Meta {
            slug: "balloon-risk-task",
            name: "Balloon Analog Risk Task",
            records_key: "trials",
            index_key: "trial",
            total_key: "totalTrials",
        }
    }

    fn total_trials(&self) -> usize {
        self.cfg.trials
    }

    fn generate_trials(&self, rng: &mut dyn RngCore) -> Vec<Balloon> {
        let tiers: Vec<Balloon> = self
            .cfg
            .max_pumps
            .iter()
            .map(|&max_pumps| Balloon { max_pumps, points_per_pump: self.cfg.points_per_pump })
            .collect();
        sdk::sampled(rng, &tiers, self.cfg.trials)
    }

    fn init_env(&self, _rng: &mut dyn RngCore) -> Inflation {
        Inflation::default()
    }

    fn begin_trial(
        &self,
        _trial: &Balloon,
        env: &mut Inflation,
        _ctx: &TrialContext<'_, BalloonResult>,
        _rng: &mut dyn RngCore,
    ) {
        *env = Inflation::default();
    }

    fn act(
        &self,
        trial: &Balloon,
        env: &mut Inflation,
        action: Action,
        _ctx: &TrialContext<'_, BalloonResult>,
        rng: &mut dyn RngCore,
    ) -> LabResult<Progress<BalloonResult>> {
        let pumps = env.pumps;
        let done = |popped: bool, points: f64| Progress::Complete {
            value: points,
            detail: BalloonResult { pumps, max_pumps: trial.max_pumps, popped, points },
        };
        Ok(match action {
            Action::Collect => done(false, env.pending),
            Action::Pump if hazard::pump(rng, trial.max_pumps, pumps) => done(true, 0.0),
            Action::Pump => {
                env.pumps += 1;
                env.pending += trial.points_per_pump;
                Progress::Continue
            }
        })
    }

    fn summarize(&self, history: &[ChoiceRecord<BalloonResult>]) -> Summary {
        let collected: Vec<f64> = history
            .iter()
            .filter(|r| !r.detail.popped)
            .map(|r| f64::from(r.detail.pumps))
            .collect();

        let mut by_max_pumps: BTreeMap<u32, TierStats> = BTreeMap::new();
        for (tier, g) in stats::breakdown(history.iter().map(|r| (r.detail.max_pumps, f64::from(r.detail.pumps)))) {
            let pop_rate = stats::rate_by(
                history.iter().filter(|r| r.detail.max_pumps == tier),
                |r| r.detail.popped,
            );
            by_max_pumps.insert(tier, TierStats { count: g.count, average_pumps: g.mean, pop_rate });
        }

        Summary {
            average_pumps: stats::mean_by(history, |r| f64::from(r.detail.pumps)),
            adjusted_average_pumps: stats::mean_or_zero(&collected),
            pop_rate: stats::rate_by(history, |r| r.detail.popped),
            by_max_pumps,
        }
    }
}
