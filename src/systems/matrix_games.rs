//! Two-action matrix games against a simulated counterpart: Prisoner's
//! Dilemma, Chicken and Stag Hunt.
//!
//! Each game names its two moves (`primary` / `alternative`) and scores a
//! round by a constant payoff matrix. The counterpart sees only history.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::mechanics::payoff::{self, PayoffMatrix};
use crate::mechanics::{control, stats};
use crate::systems::policy::{AdaptiveRate, TitForTat};
use crate::systems::sdk::{self, ChoiceRecord, Experiment, Meta, Progress, Slot, ThinkingTime, TrialContext};
use crate::{LabError, LabResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Game {
    PrisonersDilemma,
    Chicken,
    StagHunt,
}

impl Game {
    /// (primary, alternative) move labels.
    pub fn labels(self) -> (&'static str, &'static str) {
        match self {
            Game::PrisonersDilemma => ("cooperate", "defect"),
            Game::Chicken => ("continue", "swerve"),
            Game::StagHunt => ("stag", "hare"),
        }
    }

    pub fn matrix(self) -> PayoffMatrix {
        match self {
            Game::PrisonersDilemma => payoff::PRISONERS_DILEMMA,
            Game::Chicken => payoff::CHICKEN,
            Game::StagHunt => payoff::STAG_HUNT,
        }
    }

    pub fn counterpart(self) -> Counterpart {
        match self {
            Game::PrisonersDilemma => Counterpart::TitForTat(TitForTat::default()),
            Game::Chicken => Counterpart::Adaptive(AdaptiveRate { base: 0.4, slope: -0.2 }),
            Game::StagHunt => Counterpart::Adaptive(AdaptiveRate { base: 0.7, slope: 0.2 }),
        }
    }

    fn meta(self) -> Meta {
        let (slug, name) = match self {
            Game::PrisonersDilemma => ("prisoners-dilemma", "Prisoner's Dilemma"),
            Game::Chicken => ("chicken-game", "Chicken Game"),
            Game::StagHunt => ("stag-hunt", "Stag Hunt"),
        };
        Meta { slug, name, records_key: "rounds", index_key: "round", total_key: "totalRounds" }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    Primary,
    Alternative,
}

impl Move {
    pub fn is_primary(self) -> bool {
        self == Move::Primary
    }

    fn from_primary(primary: bool) -> Self {
        if primary { Move::Primary } else { Move::Alternative }
    }
}

/// Counterpart rule.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Counterpart {
    TitForTat(TitForTat),
    Adaptive(AdaptiveRate),
}

impl Counterpart {
    /// Counterpart move given the rounds played so far.
    pub fn decide<R: RngCore + ?Sized>(&self, history: &[ChoiceRecord<Round>], rng: &mut R) -> Move {
        let primary = match self {
            Counterpart::TitForTat(p) => p.decide(history.last().map(|r| r.detail.player_primary), rng),
            Counterpart::Adaptive(p) => {
                let rate = control::rate_of(history, 0.0, |r| r.detail.player_primary);
                p.decide(rate, rng)
            }
        };
        Move::from_primary(primary)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub rounds: usize,
    /// Replaces the game's default counterpart.
    pub counterpart: Option<Counterpart>,
    pub thinking_ms: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self { rounds: 20, counterpart: None, thinking_ms: 1000 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub player_choice: &'static str,
    pub ai_choice: &'static str,
    pub reward: f64,
    #[serde(skip)]
    pub player_primary: bool,
    #[serde(skip)]
    pub ai_primary: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeCounts {
    pub both_primary: usize,
    pub both_alternative: usize,
    pub player_primary_only: usize,
    pub ai_primary_only: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Cooperation / continue ("risk taking") / stag rate.
    pub primary_rate: f64,
    pub ai_primary_rate: f64,
    pub mutual_primary: usize,
    pub mutual_alternative: usize,
    /// Share of rounds where both played primary (a crash in Chicken).
    pub crash_rate: f64,
    pub average_reward: f64,
    pub outcomes: OutcomeCounts,
}

#[derive(Clone, Debug)]
pub struct MatrixGame {
    pub game: Game,
    pub cfg: Config,
}

impl MatrixGame {
    pub fn new(game: Game, cfg: Config) -> Self {
        Self { game, cfg }
    }

    pub fn prisoners_dilemma() -> Self {
        Self::new(Game::PrisonersDilemma, Config::default())
    }

    pub fn chicken() -> Self {
        Self::new(Game::Chicken, Config::default())
    }

    pub fn stag_hunt() -> Self {
        Self::new(Game::StagHunt, Config::default())
    }

    pub fn counterpart(&self) -> Counterpart {
        self.cfg.counterpart.unwrap_or_else(|| self.game.counterpart())
    }

    /// Parse a move by its label (`"cooperate"`, `"swerve"`, ...).
    pub fn parse_move(&self, label: &str) -> LabResult<Move> {
        let (p, a) = self.game.labels();
        match label {
            l if l == p => Ok(Move::Primary),
            l if l == a => Ok(Move::Alternative),
            other => Err(LabError::InvalidChoice(format!("{other:?} is not a move in {}", self.game.meta().name))),
        }
    }

    fn label(&self, m: Move) -> &'static str {
        let (p, a) = self.game.labels();
        if m.is_primary() { p } else { a }
    }
}

impl Experiment for MatrixGame {
    type Trial = Slot;
    type Choice = Move;
    type Detail = Round;
    type Env = ();
    type Summary = Summary;

    fn meta(&self) -> Meta {
        self.game.meta()
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
        choice: Move,
        ctx: &TrialContext<'_, Round>,
        rng: &mut dyn RngCore,
    ) -> LabResult<Progress<Round>> {
        let ai = self.counterpart().decide(ctx.history, rng);
        let reward = self.game.matrix().payoff(choice.is_primary(), ai.is_primary());
        Ok(Progress::Complete {
            value: reward,
            detail: Round {
                player_choice: self.label(choice),
                ai_choice: self.label(ai),
                reward,
                player_primary: choice.is_primary(),
                ai_primary: ai.is_primary(),
            },
        })
    }

    fn summarize(&self, history: &[ChoiceRecord<Round>]) -> Summary {
        let mut outcomes = OutcomeCounts::default();
        for r in history {
            match (r.detail.player_primary, r.detail.ai_primary) {
                (true, true) => outcomes.both_primary += 1,
                (false, false) => outcomes.both_alternative += 1,
                (true, false) => outcomes.player_primary_only += 1,
                (false, true) => outcomes.ai_primary_only += 1,
            }
        }
        let n = history.len().max(1) as f64;
        Summary {
            primary_rate: stats::rate_by(history, |r| r.detail.player_primary),
            ai_primary_rate: stats::rate_by(history, |r| r.detail.ai_primary),
            mutual_primary: outcomes.both_primary,
            mutual_alternative: outcomes.both_alternative,
            crash_rate: outcomes.both_primary as f64 / n,
            average_reward: stats::mean_by(history, |r| r.detail.reward),
            outcomes,
        }
    }

    fn thinking_time(&self) -> Option<ThinkingTime> {
        Some(ThinkingTime::fixed(self.cfg.thinking_ms))
    }
}
