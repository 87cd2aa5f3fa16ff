//! Delay discounting: a smaller amount now or a larger amount later.

use std::collections::BTreeMap;

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::mechanics::{discount, stats};
use crate::systems::sdk::{self, ChoiceRecord, Experiment, Meta, Progress, TrialContext};
use crate::LabResult;

/// Which side of an intertemporal (or interpersonal) trade-off was taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pick {
    Immediate,
    Delayed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub trials: usize,
    pub delayed_amounts: Vec<f64>,
    /// Days.
    pub delays: Vec<u32>,
    /// Immediate amount as a share of the delayed one.
    pub ratios: Vec<f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trials: 30,
            delayed_amounts: vec![1000.0, 2000.0, 5000.0],
            delays: vec![7, 30, 90, 180, 365],
            ratios: vec![0.2, 0.4, 0.6, 0.8],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub immediate_amount: f64,
    pub delayed_amount: f64,
    pub delay: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayChoice {
    pub choice: Pick,
    pub immediate_amount: f64,
    pub delayed_amount: f64,
    pub delay: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Mean hyperbolic `k` over immediate choices; absent when there are none.
    pub discount_rate: Option<f64>,
    pub immediate_choice_rate: f64,
    /// Share of immediate picks per delay in days.
    pub immediate_rate_by_delay: BTreeMap<u32, f64>,
}

#[derive(Clone, Debug, Default)]
pub struct DelayDiscounting {
    pub cfg: Config,
}

impl DelayDiscounting {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    /// Every (amount, delay, ratio) combination, in axis order.
    pub fn combinations(&self) -> Vec<Offer> {
        let mut out = Vec::new();
        for &delayed_amount in &self.cfg.delayed_amounts {
            for &delay in &self.cfg.delays {
                for &ratio in &self.cfg.ratios {
                    out.push(Offer { immediate_amount: (delayed_amount * ratio).round(), delayed_amount, delay });
                }
            }
        }
        out
    }
}

impl Experiment for DelayDiscounting {
    type Trial = Offer;
    type Choice = Pick;
    type Detail = DelayChoice;
    type Env = ();
    type Summary = Summary;

    fn meta(&self) -> Meta {
        Meta {
            slug: "delay-discounting-task",
            name: "Delay Discounting Task",
            records_key: "choices",
            index_key: "trial",
            total_key: "totalTrials",
        }
    }

    fn total_trials(&self) -> usize {
        self.cfg.trials
    }

    fn generate_trials(&self, rng: &mut dyn RngCore) -> Vec<Offer> {
        sdk::block_shuffled(rng, &self.combinations(), self.cfg.trials)
    }

    fn init_env(&self, _rng: &mut dyn RngCore) {}

    fn act(
        &self,
        offer: &Offer,
        _env: &mut (),
        choice: Pick,
        _ctx: &TrialContext<'_, DelayChoice>,
        _rng: &mut dyn RngCore,
    ) -> LabResult<Progress<DelayChoice>> {
        // Hypothetical amounts: nothing is paid out.
        Ok(Progress::Complete {
            value: 0.0,
            detail: DelayChoice {
                choice,
                immediate_amount: offer.immediate_amount,
                delayed_amount: offer.delayed_amount,
                delay: offer.delay,
            },
        })
    }

    fn summarize(&self, history: &[ChoiceRecord<DelayChoice>]) -> Summary {
        let ks = history.iter().filter(|r| r.detail.choice == Pick::Immediate).map(|r| {
            discount::hyperbolic_k(r.detail.delayed_amount, r.detail.immediate_amount, f64::from(r.detail.delay))
        });
        let by_delay = stats::breakdown(history.iter().map(|r| {
            (r.detail.delay, if r.detail.choice == Pick::Immediate { 1.0 } else { 0.0 })
        }));
        Summary {
            discount_rate: discount::mean_finite(ks),
            immediate_choice_rate: stats::rate_by(history, |r| r.detail.choice == Pick::Immediate),
            immediate_rate_by_delay: by_delay.into_iter().map(|(d, g)| (d, g.mean)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;

    fn record(choice: Pick, immediate: f64, delayed: f64, delay: u32) -> ChoiceRecord<DelayChoice> {
        ChoiceRecord {
            trial_index: 0,
            outcome_value: 0.0,
            timestamp_ms: 0,
            detail: DelayChoice { choice, immediate_amount: immediate, delayed_amount: delayed, delay },
        }
    }

    #[test]
    fn sixty_combinations_truncated_to_thirty_distinct() {
        let exp = DelayDiscounting::default();
        assert_eq!(exp.combinations().len(), 60);
        let mut rng = seeded_rng(4);
        let trials = exp.generate_trials(&mut rng);
        assert_eq!(trials.len(), 30);
        for (i, a) in trials.iter().enumerate() {
            assert!(trials[i + 1..].iter().all(|b| b != a));
        }
    }

    #[test]
    fn k_averages_only_immediate_choices() {
        let exp = DelayDiscounting::default();
        let h = vec![
            record(Pick::Immediate, 500.0, 1000.0, 100),
            record(Pick::Delayed, 200.0, 1000.0, 7),
            record(Pick::Immediate, 250.0, 1000.0, 100),
        ];
        let s = exp.summarize(&h);
        // (1 + 3) / 100 / 2
        assert!((s.discount_rate.unwrap() - 0.02).abs() < 1e-12);
        assert!((s.immediate_choice_rate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn all_delayed_has_no_rate() {
        let exp = DelayDiscounting::default();
        let s = exp.summarize(&[record(Pick::Delayed, 200.0, 1000.0, 7)]);
        assert_eq!(s.discount_rate, None);
    }
}
