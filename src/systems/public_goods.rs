//! Public goods game: four players, contributions pooled and doubled, the
//! pool split evenly. Co-players contribute more when the participant has.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::ensure_range;
use crate::mechanics::{split, stats, stoch};
use crate::systems::sdk::{self, ChoiceRecord, Experiment, Meta, Progress, Slot, ThinkingTime, TrialContext};
use crate::LabResult;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub rounds: usize,
    pub endowment: f64,
    pub multiplier: f64,
    /// Including the participant.
    pub players: usize,
    /// Assumed participant rate before any history.
    pub prior_rate: f64,
    pub base_rate: f64,
    pub rate_slope: f64,
    pub noise: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rounds: 20,
            endowment: 100.0,
            multiplier: 2.0,
            players: 4,
            prior_rate: 0.5,
            base_rate: 0.3,
            rate_slope: 0.4,
            noise: 0.2,
        }
    }
}

impl Config {
    /// One co-player contribution given the participant's historical rate.
    pub fn co_player<R: RngCore + ?Sized>(&self, player_rate: f64, rng: &mut R) -> f64 {
        let rate = self.base_rate + self.rate_slope * player_rate + stoch::uniform(rng, 0.0, self.noise);
        (self.endowment * rate).round()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub contribution: f64,
    pub total_contributions: f64,
    pub multiplied_amount: f64,
    pub payout: f64,
    pub other_contributions: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub average_contribution: f64,
    /// Mean pool per round, divided by the number of players.
    pub average_group_contribution: f64,
    pub average_payout: f64,
    /// Rounds by contribution band: ≤30 %, ≤60 %, above.
    pub low_contribution_rounds: usize,
    pub medium_contribution_rounds: usize,
    pub high_contribution_rounds: usize,
}

#[derive(Clone, Debug, Default)]
pub struct PublicGoods {
    pub cfg: Config,
}

impl PublicGoods {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }
}

impl Experiment for PublicGoods {
    type Trial = Slot;
    type Choice = f64;
    type Detail = Contribution;
    type Env = ();
    type Summary = Summary;

    fn meta(&self) -> Meta {
        Meta {
            slug: "public-goods-game",
            name: "Public Goods Game",
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
        contribution: f64,
        ctx: &TrialContext<'_, Contribution>,
        rng: &mut dyn RngCore,
    ) -> LabResult<Progress<Contribution>> {
        let cfg = &self.cfg;
        let own = ensure_range("contribution", contribution, 0.0, cfg.endowment)?;
        let past: f64 = ctx.history.iter().map(|r| r.detail.contribution).sum();
        let rate = if ctx.history.is_empty() {
            cfg.prior_rate
        } else {
            (past / (ctx.history.len() as f64 * cfg.endowment)).clamp(0.0, 1.0)
        };
        let others: Vec<f64> = (1..cfg.players).map(|_| cfg.co_player(rate, rng)).collect();
        let total = own + others.iter().sum::<f64>();
        let payout = split::public_goods_share(total, cfg.multiplier, cfg.players);
        Ok(Progress::Complete {
            value: payout - own,
            detail: Contribution {
                contribution: own,
                total_contributions: total,
                multiplied_amount: total * cfg.multiplier,
                payout,
                other_contributions: others,
            },
        })
    }

    fn summarize(&self, history: &[ChoiceRecord<Contribution>]) -> Summary {
        let e = self.cfg.endowment;
        let band = |lo: f64, hi: f64| {
            history
                .iter()
                .filter(|r| r.detail.contribution > lo * e && r.detail.contribution <= hi * e)
                .count()
        };
        Summary {
            average_contribution: stats::mean_by(history, |r| r.detail.contribution),
            average_group_contribution: stats::mean_by(history, |r| {
                r.detail.total_contributions / self.cfg.players.max(1) as f64
            }),
            average_payout: stats::mean_by(history, |r| r.detail.payout),
            low_contribution_rounds: band(f64::NEG_INFINITY, 0.3),
            medium_contribution_rounds: band(0.3, 0.6),
            high_contribution_rounds: band(0.6, f64::INFINITY),
        }
    }

    fn thinking_time(&self) -> Option<ThinkingTime> {
        Some(ThinkingTime::fixed(1000))
    }
}
