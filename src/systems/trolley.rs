//! Trolley dilemmas, presented in a fixed order. Personal dilemmas require
//! direct physical harm, impersonal ones act through a mechanism.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::LabResult;
use crate::mechanics::stats;
use crate::systems::sdk::{ChoiceRecord, Experiment, Meta, Progress, TrialContext};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DilemmaKind {
    Personal,
    Impersonal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dilemma {
    pub id: u32,
    #[serde(rename = "type")]
    pub kind: DilemmaKind,
    pub action: String,
}

fn dilemma(id: u32, kind: DilemmaKind, action: &str) -> Dilemma {
    Dilemma { id, kind, action: action.to_owned() }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub scenarios: Vec<Dilemma>,
}

impl Default for Config {
    fn default() -> Self {
        use DilemmaKind::*;
        Self {
            scenarios: vec![
                dilemma(1, Impersonal, "pull the lever"),
                dilemma(2, Personal, "push the stranger"),
                dilemma(3, Impersonal, "press the button"),
                dilemma(4, Personal, "perform the transplant"),
                dilemma(5, Impersonal, "activate the device"),
            ],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub scenario_id: u32,
    #[serde(rename = "type")]
    pub kind: DilemmaKind,
    /// `true` for the utilitarian option (sacrifice one to save five).
    pub choice: bool,
    /// Milliseconds from scenario onset to decision.
    pub decision_time: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub utilitarian_choice_rate: f64,
    pub personal_dilemma_rate: f64,
    pub impersonal_dilemma_rate: f64,
    pub average_decision_time: f64,
}

#[derive(Clone, Debug, Default)]
pub struct Trolley {
    pub cfg: Config,
}

impl Trolley {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }
}

impl Experiment for Trolley {
    type Trial = Dilemma;
    /// Utilitarian?
    type Choice = bool;
    type Detail = Decision;
    type Env = ();
    type Summary = Summary;

    fn meta(&self) -> Meta {
        Meta {
            slug: "trolley-problem",
            name: "Trolley Problem",
            records_key: "decisions",
            index_key: "trial",
            total_key: "totalScenarios",
        }
    }

    fn total_trials(&self) -> usize {
        self.cfg.scenarios.len()
    }

    fn generate_trials(&self, _rng: &mut dyn RngCore) -> Vec<Dilemma> {
        self.cfg.scenarios.clone()
    }

    fn init_env(&self, _rng: &mut dyn RngCore) {}

    fn act(
        &self,
        trial: &Dilemma,
        _env: &mut (),
        utilitarian: bool,
        ctx: &TrialContext<'_, Decision>,
        _rng: &mut dyn RngCore,
    ) -> LabResult<Progress<Decision>> {
        Ok(Progress::Complete {
            value: 0.0,
            detail: Decision {
                scenario_id: trial.id,
                kind: trial.kind,
                choice: utilitarian,
                decision_time: ctx.now_ms - ctx.trial_started_ms,
            },
        })
    }

    fn summarize(&self, history: &[ChoiceRecord<Decision>]) -> Summary {
        let rate_for = |kind: DilemmaKind| {
            stats::rate_by(history.iter().filter(|r| r.detail.kind == kind), |r| r.detail.choice)
        };
        Summary {
            utilitarian_choice_rate: stats::rate_by(history, |r| r.detail.choice),
            personal_dilemma_rate: rate_for(DilemmaKind::Personal),
            impersonal_dilemma_rate: rate_for(DilemmaKind::Impersonal),
            average_decision_time: stats::mean_by(history, |r| r.detail.decision_time as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;

    #[test]
    fn fixed_order_and_kinds() {
        let exp = Trolley::default();
        let trials = exp.generate_trials(&mut seeded_rng(0));
        let ids: Vec<u32> = trials.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        let personal: Vec<u32> =
            trials.iter().filter(|d| d.kind == DilemmaKind::Personal).map(|d| d.id).collect();
        assert_eq!(personal, vec![2, 4]);
    }

    #[test]
    fn decision_time_is_measured_from_onset() {
        let exp = Trolley::default();
        let trial = &exp.cfg.scenarios[0];
        let ctx = TrialContext { index: 0, trial_started_ms: 1_000, now_ms: 3_500, history: &[] };
        let out = exp.act(trial, &mut (), true, &ctx, &mut seeded_rng(0)).unwrap();
        let Progress::Complete { detail, .. } = out else { panic!("always completes") };
        assert_eq!(detail.decision_time, 2_500);
    }
}
