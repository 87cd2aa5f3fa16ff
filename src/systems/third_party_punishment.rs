//! Third-party punishment: watch an allocator split a pot with a recipient
//! and pay to punish the allocator.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::ensure_range;
use crate::mechanics::{split, stats};
use crate::systems::policy::FixedRange;
use crate::systems::sdk::{self, ChoiceRecord, Experiment, Meta, Progress, Slot, ThinkingTime, TrialContext};
use crate::{LabError, LabResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub rounds: usize,
    pub total_amount: f64,
    pub max_punishment: f64,
    pub cost_per_point: f64,
    pub impact_per_point: f64,
    /// Allocations below this share of the pot count as unfair.
    pub fair_threshold: f64,
    pub allocations: FixedRange,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rounds: 20,
            total_amount: 100.0,
            max_punishment: 30.0,
            cost_per_point: 1.0,
            impact_per_point: 3.0,
            fair_threshold: 0.4,
            allocations: FixedRange::new(0.1, 0.5),
        }
    }
}

/// Allocation currently on display.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Observed {
    pub allocation: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Judgement {
    pub allocation: f64,
    pub total_amount: f64,
    pub punishment: f64,
    pub punishment_cost: f64,
    /// Points the allocator loses.
    pub punishment_impact: f64,
}

impl Judgement {
    pub fn fairness_ratio(&self) -> f64 {
        if self.total_amount > 0.0 { self.allocation / self.total_amount } else { 0.0 }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub count: usize,
    pub avg_punishment: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub average_punishment: f64,
    /// Share of rounds with any punishment.
    pub punishment_rate: f64,
    /// Punishment rate restricted to unfair allocations.
    pub unfair_punishment_rate: f64,
    /// Allocation share ≤20 %, 20–40 %, 40–60 %.
    pub very_unfair: Band,
    pub unfair: Band,
    pub fair: Band,
}

#[derive(Clone, Debug, Default)]
pub struct ThirdPartyPunishment {
    pub cfg: Config,
}

impl ThirdPartyPunishment {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    pub fn is_unfair(&self, j: &Judgement) -> bool {
        j.fairness_ratio() < self.cfg.fair_threshold
    }
}

impl Experiment for ThirdPartyPunishment {
    type Trial = Slot;
    /// Punishment points, `0..=max_punishment`.
    type Choice = f64;
    type Detail = Judgement;
    type Env = Observed;
    type Summary = Summary;

    fn meta(&self) -> Meta {
        Meta {
            slug: "third-party-punishment",
            name: "Third-Party Punishment",
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

    fn init_env(&self, _rng: &mut dyn RngCore) -> Observed {
        Observed::default()
    }

    fn begin_trial(&self, _trial: &Slot, env: &mut Observed, _ctx: &TrialContext<'_, Judgement>, rng: &mut dyn RngCore) {
        env.allocation = Some(self.cfg.allocations.draw(self.cfg.total_amount, rng));
    }

    fn act(
        &self,
        _trial: &Slot,
        env: &mut Observed,
        points: f64,
        _ctx: &TrialContext<'_, Judgement>,
        _rng: &mut dyn RngCore,
    ) -> LabResult<Progress<Judgement>> {
        let cfg = &self.cfg;
        let allocation = env
            .allocation
            .ok_or_else(|| LabError::InvalidChoice("no allocation to judge".into()))?;
        let points = ensure_range("punishment", points, 0.0, cfg.max_punishment)?;
        let (cost, impact) = split::punishment(points, cfg.cost_per_point, cfg.impact_per_point);
        Ok(Progress::Complete {
            value: -cost,
            detail: Judgement {
                allocation,
                total_amount: cfg.total_amount,
                punishment: points,
                punishment_cost: cost,
                punishment_impact: impact,
            },
        })
    }

    fn summarize(&self, history: &[ChoiceRecord<Judgement>]) -> Summary {
        let band = |lo: f64, hi: f64| {
            let rows: Vec<f64> = history
                .iter()
                .filter(|r| {
                    let f = r.detail.fairness_ratio();
                    f > lo && f <= hi
                })
                .map(|r| r.detail.punishment)
                .collect();
            Band { count: rows.len(), avg_punishment: stats::mean_or_zero(&rows) }
        };
        Summary {
            average_punishment: stats::mean_by(history, |r| r.detail.punishment),
            punishment_rate: stats::rate_by(history, |r| r.detail.punishment > 0.0),
            unfair_punishment_rate: stats::rate_by(
                history.iter().filter(|r| self.is_unfair(&r.detail)),
                |r| r.detail.punishment > 0.0,
            ),
            very_unfair: band(f64::NEG_INFINITY, 0.2),
            unfair: band(0.2, 0.4),
            fair: band(0.4, 0.6),
        }
    }

    fn thinking_time(&self) -> Option<ThinkingTime> {
        Some(ThinkingTime::fixed(1000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;

    fn record(allocation: f64, punishment: f64) -> ChoiceRecord<Judgement> {
        ChoiceRecord {
            trial_index: 0,
            outcome_value: -punishment,
            timestamp_ms: 0,
            detail: Judgement {
                allocation,
                total_amount: 100.0,
                punishment,
                punishment_cost: punishment,
                punishment_impact: 3.0 * punishment,
            },
        }
    }

    #[test]
    fn punishing_costs_one_per_point() {
        let exp = ThirdPartyPunishment::default();
        let mut rng = seeded_rng(9);
        let ctx = TrialContext { index: 0, trial_started_ms: 0, now_ms: 0, history: &[] };
        let mut env = exp.init_env(&mut rng);
        exp.begin_trial(&Slot { number: 1 }, &mut env, &ctx, &mut rng);
        assert!((10.0..=50.0).contains(&env.allocation.unwrap()));
        let Progress::Complete { value, detail } = exp.act(&Slot { number: 1 }, &mut env, 10.0, &ctx, &mut rng).unwrap()
        else {
            panic!("judging completes the round")
        };
        assert_eq!(value, -10.0);
        assert_eq!(detail.punishment_impact, 30.0);
        assert!(exp.act(&Slot { number: 1 }, &mut env, 31.0, &ctx, &mut rng).is_err());
    }

    #[test]
    fn unfair_rate_ignores_fair_rounds() {
        let exp = ThirdPartyPunishment::default();
        let history = vec![record(10.0, 20.0), record(30.0, 0.0), record(45.0, 5.0)];
        let s = exp.summarize(&history);
        assert_eq!(s.unfair_punishment_rate, 0.5);
        assert!((s.punishment_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(s.very_unfair, Band { count: 1, avg_punishment: 20.0 });
        assert_eq!(s.fair.count, 1);
    }
}
