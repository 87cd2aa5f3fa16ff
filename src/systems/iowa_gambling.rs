//! Iowa Gambling Task: four decks, two with high reward and ruinous
//! penalties, two with modest reward and small penalties.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::mechanics::{stats, stoch};
use crate::systems::sdk::{self, ChoiceRecord, Experiment, Meta, Progress, Slot, TrialContext};
use crate::{LabError, LabResult};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub reward: f64,
    pub penalty: f64,
    pub penalty_probability: f64,
}

impl Deck {
    pub fn expected_value(&self) -> f64 {
        self.reward + self.penalty * self.penalty_probability
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub trials: usize,
    pub initial_money: f64,
    pub decks: Vec<Deck>,
}

impl Default for Config {
    fn default() -> Self {
        let risky = Deck { reward: 100.0, penalty: -1250.0, penalty_probability: 0.1 };
        let safe = Deck { reward: 50.0, penalty: -50.0, penalty_probability: 0.5 };
        Self { trials: 100, initial_money: 2000.0, decks: vec![risky, risky, safe, safe] }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckDraw {
    /// 1-based deck number (A = 1).
    pub deck: usize,
    pub gain: f64,
    pub penalized: bool,
    pub cumulative_money: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckStats {
    pub deck: usize,
    pub count: usize,
    pub total_gain: f64,
    pub avg_gain: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub initial_money: f64,
    pub final_money: f64,
    pub deck_statistics: Vec<DeckStats>,
    pub most_chosen_deck: Option<usize>,
    pub most_profitable_deck: Option<usize>,
    /// Share of picks from the advantageous decks (positive expected value).
    pub advantageous_rate: f64,
}

#[derive(Clone, Debug, Default)]
pub struct IowaGambling {
    pub cfg: Config,
}

impl IowaGambling {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }
}

impl Experiment for IowaGambling {
    type Trial = Slot;
    /// 0-based deck index.
    type Choice = usize;
    type Detail = DeckDraw;
    /// Current money.
    type Env = f64;
    type Summary = Summary;

    fn meta(&self) -> Meta {
        Meta {
            slug: "iowa-gambling-task",
            name: "Iowa Gambling Task",
            records_key: "choices",
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

    fn init_env(&self, _rng: &mut dyn RngCore) -> f64 {
        self.cfg.initial_money
    }

    fn act(
        &self,
        _trial: &Slot,
        money: &mut f64,
        deck: usize,
        _ctx: &TrialContext<'_, DeckDraw>,
        rng: &mut dyn RngCore,
    ) -> LabResult<Progress<DeckDraw>> {
        let d = self
            .cfg
            .decks
            .get(deck)
            .ok_or_else(|| LabError::InvalidChoice(format!("no deck {deck}")))?;
        let penalized = stoch::bernoulli(rng, d.penalty_probability);
        let gain = d.reward + if penalized { d.penalty } else { 0.0 };
        *money += gain;
        Ok(Progress::Complete {
            value: gain,
            detail: DeckDraw { deck: deck + 1, gain, penalized, cumulative_money: *money },
        })
    }

    fn summarize(&self, history: &[ChoiceRecord<DeckDraw>]) -> Summary {
        let mut per_deck: Vec<DeckStats> = (1..=self.cfg.decks.len())
            .map(|deck| DeckStats { deck, ..DeckStats::default() })
            .collect();
        for r in history {
            if let Some(s) = r.detail.deck.checked_sub(1).and_then(|i| per_deck.get_mut(i)) {
                s.count += 1;
                s.total_gain += r.detail.gain;
            }
        }
        for s in per_deck.iter_mut() {
            s.avg_gain = if s.count == 0 { 0.0 } else { s.total_gain / s.count as f64 };
        }

        let counts: Vec<f64> = per_deck.iter().map(|s| s.count as f64).collect();
        let gains: Vec<f64> = per_deck.iter().map(|s| s.total_gain).collect();
        let (most_chosen_deck, most_profitable_deck) = if history.is_empty() {
            (None, None)
        } else {
            (stats::argmax(&counts).map(|i| i + 1), stats::argmax(&gains).map(|i| i + 1))
        };

        let good = |deck: usize| deck.checked_sub(1).and_then(|i| self.cfg.decks.get(i)).is_some_and(|d| d.expected_value() > 0.0);
        Summary {
            initial_money: self.cfg.initial_money,
            final_money: self.cfg.initial_money + history.iter().map(|r| r.detail.gain).sum::<f64>(),
            deck_statistics: per_deck,
            most_chosen_deck,
            most_profitable_deck,
            advantageous_rate: stats::rate_by(history, |r| good(r.detail.deck)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;

    #[test]
    fn default_uses_default_config() {
        assert_eq!(IowaGambling::default().cfg, IowaGambling::new(Config::default()).cfg);
        assert_eq!(IowaGambling::default().total_trials(), 100);
    }

    #[test]
    fn decks_ab_are_disadvantageous() {
        let cfg = Config::default();
        assert_eq!(cfg.decks[0].expected_value(), -25.0);
        assert_eq!(cfg.decks[2].expected_value(), 25.0);
    }

    #[test]
    fn safe_deck_gain_is_fifty_or_zero() {
        let exp = IowaGambling::default();
        let mut rng = seeded_rng(12);
        let mut money = 2000.0;
        let ctx = TrialContext { index: 0, trial_started_ms: 0, now_ms: 0, history: &[] };
        for _ in 0..200 {
            let Progress::Complete { value, detail } =
                exp.act(&Slot { number: 1 }, &mut money, 2, &ctx, &mut rng).unwrap()
            else {
                panic!("deck draws always complete");
            };
            assert!(value == 50.0 || value == 0.0);
            assert_eq!(detail.cumulative_money, money);
        }
        assert!(exp.act(&Slot { number: 1 }, &mut money, 4, &ctx, &mut rng).is_err());
    }
}
