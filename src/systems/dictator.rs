//! Dictator game: split a pot with a passive recipient.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::ensure_range;
use crate::mechanics::{discount, split, stats};
use crate::systems::sdk::{self, ChoiceRecord, Experiment, Meta, Progress, Slot, TrialContext};
use crate::LabResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub rounds: usize,
    pub total_amount: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self { rounds: 20, total_amount: 100.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    /// Amount given away.
    pub allocation: f64,
    pub total_amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub average_allocation: f64,
    /// `mean(1 - |a - T/2| / (T/2))`: 1 for always-even splits.
    pub fairness_index: f64,
    /// Share of rounds that kept everything.
    pub selfish_rate: f64,
}

#[derive(Clone, Debug, Default)]
pub struct Dictator {
    pub cfg: Config,
}

impl Dictator {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }
}

impl Experiment for Dictator {
    type Trial = Slot;
    /// Amount given, `0..=total_amount`.
    type Choice = f64;
    type Detail = Allocation;
    type Env = ();
    type Summary = Summary;

    fn meta(&self) -> Meta {
        Meta {
            slug: "dictator-game",
            name: "Dictator Game",
            records_key: "rounds",
            index_key: "round",
            total_key: "totalRounds",
        }
    }

    fn total_trials(&self) -> usize {
        self.cfg.rounds
    }

    fn generate_trials(&self, _rng: &mut dyn RngCore) -> Vec<Slot> {
        sdk::slots(self.cfg.rounds)
    }

    fn init_env(&self, _rng: &mut dyn RngCore) {}

    fn act(
        &self,
        _trial: &Slot,
        _env: &mut (),
        given: f64,
        _ctx: &TrialContext<'_, Allocation>,
        _rng: &mut dyn RngCore,
    ) -> LabResult<Progress<Allocation>> {
        let total = self.cfg.total_amount;
        let given = ensure_range("allocation", given, 0.0, total)?;
        Ok(Progress::Complete {
            value: split::dictator_keep(total, given),
            detail: Allocation { allocation: given, total_amount: total },
        })
    }

    fn summarize(&self, history: &[ChoiceRecord<Allocation>]) -> Summary {
        Summary {
            average_allocation: stats::mean_by(history, |r| r.detail.allocation),
            fairness_index: stats::mean_by(history, |r| discount::fairness(r.detail.allocation, r.detail.total_amount)),
            selfish_rate: stats::rate_by(history, |r| r.detail.allocation == 0.0),
        }
    }
}
