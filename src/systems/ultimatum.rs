//! Ultimatum game with alternating roles. As proposer the participant
//! offers a share of the pot; as responder they accept or reject the
//! counterpart's offer. A rejection leaves both with nothing.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::ensure_range;
use crate::mechanics::{split, stats};
use crate::systems::policy::{FixedRange, ThresholdAcceptance};
use crate::systems::sdk::{self, ChoiceRecord, Experiment, Meta, Progress, ThinkingTime, TrialContext};
use crate::{LabError, LabResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Proposer,
    Responder,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    Accept,
    Reject,
}

impl Response {
    fn from_accepted(accepted: bool) -> Self {
        if accepted { Response::Accept } else { Response::Reject }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub rounds: usize,
    pub total_amount: f64,
    pub responder: ThresholdAcceptance,
    /// Counterpart offers as a share of the pot.
    pub offers: FixedRange,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rounds: 20,
            total_amount: 100.0,
            responder: ThresholdAcceptance::default(),
            offers: FixedRange::new(0.3, 0.5),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct UltimatumRound {
    pub role: Role,
}

/// Participant action; must match the round's role.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    Offer(f64),
    Respond(bool),
}

/// Offer the counterpart put on the table this round.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Table {
    pub ai_offer: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRecord {
    pub role: Role,
    pub offer: f64,
    pub total_amount: f64,
    pub response: Response,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Mean offer in proposer rounds.
    pub average_offer: f64,
    pub acceptance_rate: f64,
    /// Share of counterpart offers the participant accepted.
    pub responder_acceptance_rate: f64,
}

#[derive(Clone, Debug, Default)]
pub struct Ultimatum {
    pub cfg: Config,
}

impl Ultimatum {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }
}

impl Experiment for Ultimatum {
    type Trial = UltimatumRound;
    type Choice = Action;
    type Detail = OfferRecord;
    type Env = Table;
    type Summary = Summary;

    fn meta(&self) -> Meta {
        Meta {
            slug: "ultimatum-game",
            name: "Ultimatum Game",
            records_key: "rounds",
            index_key: "round",
            total_key: "totalRounds",
        }
    }

    fn total_trials(&self) -> usize {
        self.cfg.rounds
    }

    fn generate_trials(&self, rng: &mut dyn RngCore) -> Vec<UltimatumRound> {
        sdk::alternating(rng, Role::Proposer, Role::Responder, self.cfg.rounds)
            .into_iter()
            .map(|role| UltimatumRound { role })
            .collect()
    }

    fn init_env(&self, _rng: &mut dyn RngCore) -> Table {
        Table::default()
    }

    fn begin_trial(
        &self,
        trial: &UltimatumRound,
        env: &mut Table,
        _ctx: &TrialContext<'_, OfferRecord>,
        rng: &mut dyn RngCore,
    ) {
        env.ai_offer = match trial.role {
            Role::Responder => Some(self.cfg.offers.draw(self.cfg.total_amount, rng)),
            Role::Proposer => None,
        };
    }

    fn act(
        &self,
        trial: &UltimatumRound,
        env: &mut Table,
        action: Action,
        _ctx: &TrialContext<'_, OfferRecord>,
        rng: &mut dyn RngCore,
    ) -> LabResult<Progress<OfferRecord>> {
        let pot = self.cfg.total_amount;
        let (offer, accepted, value) = match (trial.role, action) {
            (Role::Proposer, Action::Offer(x)) => {
                let x = ensure_range("offer", x, 0.0, pot)?;
                let accepted = self.cfg.responder.decide(x, pot, rng);
                (x, accepted, split::ultimatum(pot, x, accepted).0)
            }
            (Role::Responder, Action::Respond(accepted)) => {
                let x = env
                    .ai_offer
                    .ok_or_else(|| LabError::InvalidChoice("no offer on the table".into()))?;
                (x, accepted, split::ultimatum(pot, x, accepted).1)
            }
            (role, other) => {
                return Err(LabError::InvalidChoice(format!("{other:?} while {role:?}")));
            }
        };
        Ok(Progress::Complete {
            value,
            detail: OfferRecord {
                role: trial.role,
                offer,
                total_amount: pot,
                response: Response::from_accepted(accepted),
            },
        })
    }

    fn summarize(&self, history: &[ChoiceRecord<OfferRecord>]) -> Summary {
        let accepted = |r: &&ChoiceRecord<OfferRecord>| r.detail.response == Response::Accept;
        Summary {
            average_offer: stats::mean_by(
                history.iter().filter(|r| r.detail.role == Role::Proposer),
                |r| r.detail.offer,
            ),
            acceptance_rate: stats::rate_by(history, accepted),
            responder_acceptance_rate: stats::rate_by(
                history.iter().filter(|r| r.detail.role == Role::Responder),
                accepted,
            ),
        }
    }

    fn thinking_time(&self) -> Option<ThinkingTime> {
        Some(ThinkingTime::between(1000, 2000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;

    fn ctx() -> TrialContext<'static, OfferRecord> {
        TrialContext { index: 0, trial_started_ms: 0, now_ms: 0, history: &[] }
    }

    #[test]
    fn wrong_kind_of_action_is_rejected() {
        let exp = Ultimatum::default();
        let mut rng = seeded_rng(1);
        let mut env = Table::default();
        let proposer = UltimatumRound { role: Role::Proposer };
        assert!(matches!(
            exp.act(&proposer, &mut env, Action::Respond(true), &ctx(), &mut rng),
            Err(LabError::InvalidChoice(_))
        ));
    }

    #[test]
    fn low_offers_are_always_rejected_full_offers_always_accepted() {
        let exp = Ultimatum::default();
        let mut rng = seeded_rng(2);
        let mut env = Table::default();
        let proposer = UltimatumRound { role: Role::Proposer };
        for _ in 0..500 {
            let Progress::Complete { detail, value } =
                exp.act(&proposer, &mut env, Action::Offer(20.0), &ctx(), &mut rng).unwrap()
            else {
                panic!("offers complete the round")
            };
            assert_eq!(detail.response, Response::Reject);
            assert_eq!(value, 0.0);
            let Progress::Complete { detail, .. } =
                exp.act(&proposer, &mut env, Action::Offer(100.0), &ctx(), &mut rng).unwrap()
            else {
                panic!("offers complete the round")
            };
            assert_eq!(detail.response, Response::Accept);
        }
    }

    #[test]
    fn responder_offer_is_drawn_at_round_start() {
        let exp = Ultimatum::default();
        let mut rng = seeded_rng(3);
        let mut env = Table::default();
        let responder = UltimatumRound { role: Role::Responder };
        exp.begin_trial(&responder, &mut env, &ctx(), &mut rng);
        let offer = env.ai_offer.unwrap();
        assert!((30.0..=50.0).contains(&offer));
        let out = exp.act(&responder, &mut env, Action::Respond(true), &ctx(), &mut rng).unwrap();
        assert_eq!(out, Progress::Complete {
            value: offer,
            detail: OfferRecord { role: Role::Responder, offer, total_amount: 100.0, response: Response::Accept },
        });
    }
}
