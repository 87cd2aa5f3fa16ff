//! Social discounting: keep an amount for yourself or give a larger amount
//! to someone at a given social distance (1 = closest, 100 = stranger).

use std::collections::BTreeMap;

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::LabResult;
use crate::mechanics::{discount, stats};
use crate::systems::delay_discounting::Pick;
use crate::systems::sdk::{self, ChoiceRecord, Experiment, Meta, Progress, TrialContext};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub trials: usize,
    pub distances: Vec<u32>,
    pub ratios: Vec<f64>,
    pub base_reward: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trials: 40,
            distances: vec![1, 2, 5, 10, 20, 50, 100],
            ratios: vec![0.2, 0.4, 0.6, 0.8],
            base_reward: 1000.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialOffer {
    pub social_distance: u32,
    pub immediate_reward: f64,
    pub delayed_reward: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialChoice {
    pub social_distance: u32,
    pub immediate_reward: f64,
    pub delayed_reward: f64,
    /// `immediate` = selfish, `delayed` = altruistic.
    pub choice: Pick,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub selfish_choice_rate: f64,
    pub social_discount_rate: f64,
    /// Altruistic share per social distance.
    pub altruistic_rate_by_distance: BTreeMap<u32, f64>,
}

#[derive(Clone, Debug, Default)]
pub struct SocialDiscounting {
    pub cfg: Config,
}

impl SocialDiscounting {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    pub fn combinations(&self) -> Vec<SocialOffer> {
        let base = self.cfg.base_reward;
        self.cfg
            .distances
            .iter()
            .flat_map(|&social_distance| {
                self.cfg.ratios.iter().map(move |&ratio| SocialOffer {
                    social_distance,
                    immediate_reward: (base * ratio).round(),
                    delayed_reward: base,
                })
            })
            .collect()
    }
}

impl Experiment for SocialDiscounting {
    type Trial = SocialOffer;
    type Choice = Pick;
    type Detail = SocialChoice;
    type Env = ();
    type Summary = Summary;

    fn meta(&self) -> Meta {
        Meta {
            slug: "social-discounting-task",
            name: "Social Discounting Task",
            records_key: "choices",
            index_key: "trial",
            total_key: "totalTrials",
        }
    }

    fn total_trials(&self) -> usize {
        self.cfg.trials
    }

    fn generate_trials(&self, rng: &mut dyn RngCore) -> Vec<SocialOffer> {
        sdk::block_shuffled(rng, &self.combinations(), self.cfg.trials)
    }

    fn init_env(&self, _rng: &mut dyn RngCore) {}

    fn act(
        &self,
        offer: &SocialOffer,
        _env: &mut (),
        choice: Pick,
        _ctx: &TrialContext<'_, SocialChoice>,
        _rng: &mut dyn RngCore,
    ) -> LabResult<Progress<SocialChoice>> {
        Ok(Progress::Complete {
            value: 0.0,
            detail: SocialChoice {
                social_distance: offer.social_distance,
                immediate_reward: offer.immediate_reward,
                delayed_reward: offer.delayed_reward,
                choice,
            },
        })
    }

    fn summarize(&self, history: &[ChoiceRecord<SocialChoice>]) -> Summary {
        let by_distance: BTreeMap<u32, f64> = stats::breakdown(history.iter().map(|r| {
            (r.detail.social_distance, if r.detail.choice == Pick::Delayed { 1.0 } else { 0.0 })
        }))
        .into_iter()
        .map(|(d, g)| (d, g.mean))
        .collect();

        let ks: Vec<f64> = by_distance
            .iter()
            .map(|(&d, &rate)| discount::social_k(rate, f64::from(d)))
            .filter(|k| k.is_finite())
            .collect();

        Summary {
            selfish_choice_rate: stats::rate_by(history, |r| r.detail.choice == Pick::Immediate),
            social_discount_rate: stats::mean_or_zero(&ks),
            altruistic_rate_by_distance: by_distance,
        }
    }
}
