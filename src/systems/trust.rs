//! Trust game with alternating roles. Investments are tripled in transit;
//! the trustee decides how much of the tripled amount goes back.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::ensure_range;
use crate::mechanics::{split, stats};
use crate::systems::policy::FixedRange;
use crate::systems::sdk::{self, ChoiceRecord, Experiment, Meta, Progress, ThinkingTime, TrialContext};
use crate::{LabError, LabResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Investor,
    Trustee,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub rounds: usize,
    pub initial_amount: f64,
    pub multiplier: f64,
    /// Counterpart investment as a share of the endowment.
    pub investments: FixedRange,
    /// Counterpart return as a share of the multiplied amount.
    pub returns: FixedRange,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rounds: 20,
            initial_amount: 100.0,
            multiplier: 3.0,
            investments: FixedRange::new(0.4, 0.7),
            returns: FixedRange::new(0.4, 0.6),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TrustRound {
    pub role: Role,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Investor: amount sent, `0..=initial_amount`.
    Invest(f64),
    /// Trustee: amount returned, `0..=multiplier * invested`.
    Return(f64),
}

/// Investment the counterpart made this round.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Ledger {
    pub ai_investment: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub role: Role,
    pub initial_amount: f64,
    pub invested_amount: f64,
    pub multiplied_amount: f64,
    pub returned_amount: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Mean participant investment as investor.
    pub average_investment: f64,
    /// Mean participant return as trustee.
    pub average_return: f64,
    /// Returned ÷ multiplied amount in trustee rounds.
    pub average_return_ratio: f64,
}

#[derive(Clone, Debug, Default)]
pub struct Trust {
    pub cfg: Config,
}

impl Trust {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }
}

impl Experiment for Trust {
    type Trial = TrustRound;
    type Choice = Action;
    type Detail = Exchange;
    type Env = Ledger;
    type Summary = Summary;

    fn meta(&self) -> Meta {
        Meta {
            slug: "trust-game",
            name: "Trust Game",
            records_key: "rounds",
            index_key: "round",
            total_key: "totalRounds",
        }
    }

    fn total_trials(&self) -> usize {
        self.cfg.rounds
    }

    fn generate_trials(&self, rng: &mut dyn RngCore) -> Vec<TrustRound> {
        sdk::alternating(rng, Role::Investor, Role::Trustee, self.cfg.rounds)
            .into_iter()
            .map(|role| TrustRound { role })
            .collect()
    }

    fn init_env(&self, _rng: &mut dyn RngCore) -> Ledger {
        Ledger::default()
    }

    fn begin_trial(&self, trial: &TrustRound, env: &mut Ledger, _ctx: &TrialContext<'_, Exchange>, rng: &mut dyn RngCore) {
        env.ai_investment = match trial.role {
            Role::Trustee => Some(self.cfg.investments.draw(self.cfg.initial_amount, rng)),
            Role::Investor => None,
        };
    }

    fn act(
        &self,
        trial: &TrustRound,
        env: &mut Ledger,
        action: Action,
        _ctx: &TrialContext<'_, Exchange>,
        rng: &mut dyn RngCore,
    ) -> LabResult<Progress<Exchange>> {
        let m = self.cfg.multiplier;
        let (invested, returned, value) = match (trial.role, action) {
            (Role::Investor, Action::Invest(x)) => {
                let x = ensure_range("investment", x, 0.0, self.cfg.initial_amount)?;
                let back = self.cfg.returns.draw(x * m, rng);
                (x, back, split::trust(x, m, back).0)
            }
            (Role::Trustee, Action::Return(y)) => {
                let x = env
                    .ai_investment
                    .ok_or_else(|| LabError::InvalidChoice("nothing invested yet".into()))?;
                let y = ensure_range("return", y, 0.0, x * m)?;
                (x, y, split::trust(x, m, y).1)
            }
            (role, other) => {
                return Err(LabError::InvalidChoice(format!("{other:?} while {role:?}")));
            }
        };
        Ok(Progress::Complete {
            value,
            detail: Exchange {
                role: trial.role,
                initial_amount: self.cfg.initial_amount,
                invested_amount: invested,
                multiplied_amount: invested * m,
                returned_amount: returned,
            },
        })
    }

    fn summarize(&self, history: &[ChoiceRecord<Exchange>]) -> Summary {
        let as_trustee = || history.iter().filter(|r| r.detail.role == Role::Trustee);
        Summary {
            average_investment: stats::mean_by(
                history.iter().filter(|r| r.detail.role == Role::Investor),
                |r| r.detail.invested_amount,
            ),
            average_return: stats::mean_by(as_trustee(), |r| r.detail.returned_amount),
            average_return_ratio: stats::mean_by(
                as_trustee().filter(|r| r.detail.multiplied_amount > 0.0),
                |r| r.detail.returned_amount / r.detail.multiplied_amount,
            ),
        }
    }

    fn thinking_time(&self) -> Option<ThinkingTime> {
        Some(ThinkingTime::between(1000, 2000))
    }
}
