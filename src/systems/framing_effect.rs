//! Framing effect: the same sure-vs-risky choice described once as a gain
//! and once as a loss.

use std::collections::BTreeMap;

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::mechanics::{discount, stats};
use crate::systems::sdk::{self, ChoiceRecord, Experiment, Meta, Progress, TrialContext};
use crate::{LabError, LabResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frame {
    Gain,
    Loss,
}

/// Option 1 is the sure thing, option 2 the gamble.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum FramedOption {
    Sure,
    Risky,
}

impl From<FramedOption> for u8 {
    fn from(o: FramedOption) -> u8 {
        match o {
            FramedOption::Sure => 1,
            FramedOption::Risky => 2,
        }
    }
}

impl TryFrom<u8> for FramedOption {
    type Error = LabError;

    fn try_from(v: u8) -> LabResult<Self> {
        match v {
            1 => Ok(Self::Sure),
            2 => Ok(Self::Risky),
            _ => Err(LabError::InvalidChoice(format!("framing option {v}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    pub id: u32,
    pub title: String,
    /// Success probability of the risky option under each frame.
    pub gain_risky_probability: f64,
    pub loss_risky_probability: f64,
}

fn scenario(id: u32, title: &str, gain: f64, loss: f64) -> Scenario {
    Scenario { id, title: title.to_owned(), gain_risky_probability: gain, loss_risky_probability: loss }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub scenarios: Vec<Scenario>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scenarios: vec![
                scenario(1, "Medical decision", 0.33, 0.33),
                scenario(2, "Financial investment", 0.3, 0.7),
                scenario(3, "Environmental protection", 0.4, 0.6),
                scenario(4, "Education policy", 0.25, 0.75),
                scenario(5, "Employment policy", 0.3, 0.7),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FramedScenario {
    pub scenario_id: u32,
    pub title: String,
    pub frame: Frame,
    pub risky_probability: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FramedChoice {
    pub scenario_id: u32,
    pub frame: Frame,
    pub choice: FramedOption,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub gain_risky_rate: f64,
    pub loss_risky_rate: f64,
    /// Loss-frame risky rate minus gain-frame risky rate.
    pub framing_effect: f64,
    /// Per scenario: did the choice flip between frames?
    pub reversals: BTreeMap<u32, bool>,
}

#[derive(Clone, Debug, Default)]
pub struct FramingEffect {
    pub cfg: Config,
}

impl FramingEffect {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    fn combinations(&self) -> Vec<FramedScenario> {
        self.cfg
            .scenarios
            .iter()
            .flat_map(|s| {
                [(Frame::Gain, s.gain_risky_probability), (Frame::Loss, s.loss_risky_probability)]
                    .into_iter()
                    .map(move |(frame, risky_probability)| FramedScenario {
                        scenario_id: s.id,
                        title: s.title.clone(),
                        frame,
                        risky_probability,
                    })
            })
            .collect()
    }
}

impl Experiment for FramingEffect {
    type Trial = FramedScenario;
    type Choice = FramedOption;
    type Detail = FramedChoice;
    type Env = ();
    type Summary = Summary;

    fn meta(&self) -> Meta {
        Meta {
            slug: "framing-effect-tasks",
            name: "Framing Effect Tasks",
            records_key: "choices",
            index_key: "trial",
            total_key: "totalScenarios",
        }
    }

    fn total_trials(&self) -> usize {
        self.cfg.scenarios.len() * 2
    }

    fn generate_trials(&self, rng: &mut dyn RngCore) -> Vec<FramedScenario> {
        sdk::block_shuffled(rng, &self.combinations(), self.total_trials())
    }

    fn init_env(&self, _rng: &mut dyn RngCore) {}

    fn act(
        &self,
        trial: &FramedScenario,
        _env: &mut (),
        choice: FramedOption,
        _ctx: &TrialContext<'_, FramedChoice>,
        _rng: &mut dyn RngCore,
    ) -> LabResult<Progress<FramedChoice>> {
        Ok(Progress::Complete {
            value: 0.0,
            detail: FramedChoice { scenario_id: trial.scenario_id, frame: trial.frame, choice },
        })
    }

    fn summarize(&self, history: &[ChoiceRecord<FramedChoice>]) -> Summary {
        let risky_rate = |frame: Frame| {
            stats::rate_by(
                history.iter().filter(|r| r.detail.frame == frame),
                |r| r.detail.choice == FramedOption::Risky,
            )
        };
        let gain_risky_rate = risky_rate(Frame::Gain);
        let loss_risky_rate = risky_rate(Frame::Loss);

        let mut seen: BTreeMap<u32, BTreeMap<Frame, FramedOption>> = BTreeMap::new();
        for r in history {
            seen.entry(r.detail.scenario_id).or_default().insert(r.detail.frame, r.detail.choice);
        }
        let reversals = seen
            .into_iter()
            .filter_map(|(id, by_frame)| {
                let gain = by_frame.get(&Frame::Gain)?;
                let loss = by_frame.get(&Frame::Loss)?;
                Some((id, gain != loss))
            })
            .collect();

        Summary {
            gain_risky_rate,
            loss_risky_rate,
            framing_effect: discount::framing_effect(loss_risky_rate, gain_risky_rate),
            reversals,
        }
    }
}
