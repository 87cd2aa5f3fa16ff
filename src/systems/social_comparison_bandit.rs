//! Restless four-armed bandit with social comparison feedback.
//!
//! After each pull the participant sees a comparison partner's reward, mood,
//! or both, depending on the study. Arm means random-walk every round and
//! arms are occasionally withdrawn or restored. Every third round asks for a
//! mood rating.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::ensure_range;
use crate::mechanics::{stats, stoch};
use crate::systems::arms::{self, BanditArm};
use crate::systems::sdk::{ChoiceRecord, Experiment, Meta, Progress, TrialContext};
use crate::{LabError, LabResult};

pub const BANDIT_COLORS: [&str; 4] = ["Yellow", "Red", "Blue", "Green"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partner {
    Human,
    Ai,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Reward,
    Emotion,
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    pub id: u8,
    pub name: &'static str,
    #[serde(rename = "type")]
    pub partner: Partner,
    pub comparison: Comparison,
}

impl Study {
    pub fn compares_reward(&self) -> bool {
        matches!(self.comparison, Comparison::Reward | Comparison::Both)
    }

    pub fn compares_mood(&self) -> bool {
        matches!(self.comparison, Comparison::Emotion | Comparison::Both)
    }
}

pub const STUDIES: [Study; 6] = [
    Study { id: 1, name: "Human reward comparison", partner: Partner::Human, comparison: Comparison::Reward },
    Study { id: 2, name: "Human emotion comparison", partner: Partner::Human, comparison: Comparison::Emotion },
    Study { id: 3, name: "Human combined comparison", partner: Partner::Human, comparison: Comparison::Both },
    Study { id: 4, name: "AI reward comparison", partner: Partner::Ai, comparison: Comparison::Reward },
    Study { id: 5, name: "AI emotion comparison", partner: Partner::Ai, comparison: Comparison::Emotion },
    Study { id: 6, name: "AI combined comparison", partner: Partner::Ai, comparison: Comparison::Both },
];

pub fn study(id: u8) -> LabResult<Study> {
    STUDIES
        .iter()
        .find(|s| s.id == id)
        .copied()
        .ok_or_else(|| LabError::Config(format!("no study {id}")))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub study_id: u8,
    pub practice_rounds: usize,
    pub rounds: usize,
    pub mood_interval: usize,
    pub mean_range: (f64, f64),
    pub reward_sd: f64,
    pub comparison_noise: f64,
    pub drift: f64,
    /// Chance per round that availability changes at all.
    pub availability_change: f64,
    /// Never withdraw below this many arms.
    pub min_available: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            study_id: 1,
            practice_rounds: 10,
            rounds: 200,
            mood_interval: 3,
            mean_range: (30.0, 70.0),
            reward_sd: 10.0,
            comparison_noise: 15.0,
            drift: 5.0,
            availability_change: 0.1,
            min_available: 2,
        }
    }
}

impl Config {
    /// Resolve the study and reject setups that could withdraw every arm.
    pub fn validate(&self) -> LabResult<Study> {
        if self.min_available == 0 {
            return Err(LabError::Config("minAvailable must be at least 1".into()));
        }
        study(self.study_id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRound {
    /// 1-based over practice and main rounds.
    pub number: usize,
    pub is_practice: bool,
    pub asks_mood: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pull {
    pub arm: usize,
    /// Mood rating in `[0, 1]`, only on rounds that ask for one.
    pub mood: Option<f64>,
}

impl Pull {
    pub fn arm(arm: usize) -> Self {
        Self { arm, mood: None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundResult {
    pub study_id: u8,
    pub is_practice: bool,
    pub action: usize,
    pub color: &'static str,
    pub reward: f64,
    #[serde(rename = "reward_B", skip_serializing_if = "Option::is_none")]
    pub reward_b: Option<f64>,
    #[serde(rename = "mood_choice", skip_serializing_if = "Option::is_none")]
    pub mood_choice: Option<f64>,
    #[serde(rename = "mood_B", skip_serializing_if = "Option::is_none")]
    pub mood_b: Option<f64>,
    /// Means at choice time; `null` for withdrawn arms.
    pub bandit_means: Vec<Option<f64>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub study: Study,
    /// Main rounds only.
    pub total_reward: f64,
    pub average_reward: f64,
    pub practice_average_reward: f64,
    /// Distinct arms in the last 10 main rounds ÷ 4 (1 before 10 rounds).
    pub exploration_rate: f64,
    /// Mean of `reward - reward_B` where a partner reward was shown.
    pub average_reward_gap: Option<f64>,
    pub average_mood: Option<f64>,
    pub average_partner_mood: Option<f64>,
    pub choice_counts: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct SocialComparisonBandit {
    cfg: Config,
    study: Study,
}

impl SocialComparisonBandit {
    pub fn new(cfg: Config) -> LabResult<Self> {
        let study = cfg.validate()?;
        Ok(Self { cfg, study })
    }

    pub fn study(&self) -> Study {
        self.study
    }

    /// Irwin–Hall approximation of `N(mean, sd)`, clamped to `[0, 100]`.
    fn reward<R: RngCore + ?Sized>(&self, arm: &BanditArm, rng: &mut R) -> f64 {
        (stoch::irwin_hall12(rng) * self.cfg.reward_sd + arm.mean_reward).clamp(0.0, 100.0)
    }

    /// With probability `availability_change`: withdraw a random arm if a
    /// coin says so and enough remain, else restore a random withdrawn one.
    fn shuffle_availability<R: RngCore + ?Sized>(&self, arms: &mut [BanditArm], rng: &mut R) {
        if !stoch::bernoulli(rng, self.cfg.availability_change) {
            return;
        }
        let (open, closed): (Vec<usize>, Vec<usize>) = (0..arms.len()).partition(|&i| arms[i].available);
        if open.len() > self.cfg.min_available && stoch::bernoulli(rng, 0.5) {
            arms[open[stoch::index(rng, open.len())]].available = false;
        } else if !closed.is_empty() {
            arms[closed[stoch::index(rng, closed.len())]].available = true;
        }
    }
}

impl Default for SocialComparisonBandit {
    fn default() -> Self {
        Self { cfg: Config::default(), study: STUDIES[0] }
    }
}

impl Experiment for SocialComparisonBandit {
    type Trial = ComparisonRound;
    type Choice = Pull;
    type Detail = RoundResult;
    type Env = Vec<BanditArm>;
    type Summary = Summary;

    fn meta(&self) -> Meta {
        Meta {
            slug: "reward-social-comparison-bandit-task",
            name: "Reward Social Comparison Bandit Task",
            records_key: "rounds",
            index_key: "round",
            total_key: "totalRounds",
        }
    }

    fn total_trials(&self) -> usize {
        self.cfg.practice_rounds + self.cfg.rounds
    }

    fn generate_trials(&self, _rng: &mut dyn RngCore) -> Vec<ComparisonRound> {
        let every = self.cfg.mood_interval.max(1);
        (1..=self.total_trials())
            .map(|number| ComparisonRound {
                number,
                is_practice: number <= self.cfg.practice_rounds,
                asks_mood: number % every == 0,
            })
            .collect()
    }

    fn init_env(&self, rng: &mut dyn RngCore) -> Vec<BanditArm> {
        let (lo, hi) = self.cfg.mean_range;
        arms::uniform_arms(rng, BANDIT_COLORS.len(), lo, hi)
    }

    fn act(
        &self,
        round: &ComparisonRound,
        arms: &mut Vec<BanditArm>,
        pull: Pull,
        _ctx: &TrialContext<'_, RoundResult>,
        rng: &mut dyn RngCore,
    ) -> LabResult<Progress<RoundResult>> {
        let i = pull.arm;
        match arms.get(i) {
            Some(a) if a.available => {}
            Some(_) => return Err(LabError::InvalidChoice(format!("arm {i} is unavailable"))),
            None => return Err(LabError::InvalidChoice(format!("no arm {i}"))),
        }
        let mood_choice = match (round.asks_mood, pull.mood) {
            (true, Some(m)) => Some(ensure_range("mood", m, 0.0, 1.0)?),
            (false, Some(_)) => {
                return Err(LabError::InvalidChoice("this round asks for no mood rating".into()));
            }
            (_, None) => None,
        };

        let bandit_means = arms::snapshot_means(arms);
        let reward = self.reward(&arms[i], rng);
        let reward_b = self
            .study
            .compares_reward()
            .then(|| (reward + stoch::jitter(rng, self.cfg.comparison_noise)).clamp(0.0, 100.0));
        let mood_b = self.study.compares_mood().then(|| stoch::uniform01(rng));
        arms[i].record(reward);

        for arm in arms.iter_mut() {
            arm.drift(rng, self.cfg.drift, 0.0, 100.0);
        }
        self.shuffle_availability(arms, rng);

        Ok(Progress::Complete {
            value: if round.is_practice { 0.0 } else { reward },
            detail: RoundResult {
                study_id: self.study.id,
                is_practice: round.is_practice,
                action: i,
                color: BANDIT_COLORS.get(i).copied().unwrap_or("Gray"),
                reward,
                reward_b,
                mood_choice,
                mood_b,
                bandit_means,
            },
        })
    }

    fn summarize(&self, history: &[ChoiceRecord<RoundResult>]) -> Summary {
        let (practice, main): (Vec<&RoundResult>, Vec<&RoundResult>) =
            history.iter().map(|r| &r.detail).partition(|d| d.is_practice);
        let rewards: Vec<f64> = main.iter().map(|d| d.reward).collect();
        let picks: Vec<usize> = main.iter().map(|d| d.action).collect();
        let gaps: Vec<f64> = main.iter().filter_map(|d| d.reward_b.map(|b| d.reward - b)).collect();
        let moods: Vec<f64> = history.iter().filter_map(|r| r.detail.mood_choice).collect();
        let partner_moods: Vec<f64> = history.iter().filter_map(|r| r.detail.mood_b).collect();
        let mut choice_counts = vec![0; BANDIT_COLORS.len()];
        for &p in &picks {
            if let Some(c) = choice_counts.get_mut(p) {
                *c += 1;
            }
        }
        Summary {
            study: self.study,
            total_reward: rewards.iter().sum(),
            average_reward: stats::mean_or_zero(&rewards),
            practice_average_reward: stats::mean_by(&practice, |d| d.reward),
            exploration_rate: stats::exploration_rate(&picks, BANDIT_COLORS.len(), 10, 10),
            average_reward_gap: stats::mean(&gaps),
            average_mood: stats::mean(&moods),
            average_partner_mood: stats::mean(&partner_moods),
            choice_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeded_rng;

    fn ctx() -> TrialContext<'static, RoundResult> {
        TrialContext { index: 0, trial_started_ms: 0, now_ms: 0, history: &[] }
    }

    fn main_round(asks_mood: bool) -> ComparisonRound {
        ComparisonRound { number: 12, is_practice: false, asks_mood }
    }

    #[test]
    fn rounds_start_with_practice_and_ask_mood_every_third() {
        let exp = SocialComparisonBandit::default();
        let rounds = exp.generate_trials(&mut seeded_rng(0));
        assert_eq!(rounds.len(), 210);
        assert_eq!(rounds.iter().filter(|r| r.is_practice).count(), 10);
        assert!(rounds[..10].iter().all(|r| r.is_practice));
        let mood: Vec<usize> = rounds.iter().filter(|r| r.asks_mood).map(|r| r.number).take(3).collect();
        assert_eq!(mood, vec![3, 6, 9]);
    }

    #[test]
    fn unknown_study_is_a_config_error() {
        let cfg = Config { study_id: 7, ..Config::default() };
        assert!(matches!(SocialComparisonBandit::new(cfg), Err(LabError::Config(_))));
    }

    #[test]
    fn some_arm_must_stay_available() {
        let cfg = Config { min_available: 0, ..Config::default() };
        assert!(matches!(SocialComparisonBandit::new(cfg), Err(LabError::Config(_))));
        assert!(SocialComparisonBandit::new(Config { min_available: 1, ..Config::default() }).is_ok());
    }

    #[test]
    fn comparison_fields_follow_the_study() {
        let mut rng = seeded_rng(41);
        for s in STUDIES {
            let exp = SocialComparisonBandit::new(Config { study_id: s.id, ..Config::default() }).unwrap();
            let mut arms = exp.init_env(&mut rng);
            let Progress::Complete { detail, .. } = exp.act(&main_round(false), &mut arms, Pull::arm(0), &ctx(), &mut rng).unwrap()
            else {
                panic!("pulls complete the round")
            };
            assert_eq!(detail.reward_b.is_some(), [1, 3, 4, 6].contains(&s.id), "study {}", s.id);
            assert_eq!(detail.mood_b.is_some(), [2, 3, 5, 6].contains(&s.id), "study {}", s.id);
            assert!((0.0..=100.0).contains(&detail.reward));
        }
    }

    #[test]
    fn withdrawn_arms_and_stray_moods_are_rejected() {
        let exp = SocialComparisonBandit::default();
        let mut rng = seeded_rng(42);
        let mut arms = exp.init_env(&mut rng);
        arms[1].available = false;
        assert!(exp.act(&main_round(false), &mut arms, Pull::arm(1), &ctx(), &mut rng).is_err());
        assert!(exp.act(&main_round(false), &mut arms, Pull::arm(9), &ctx(), &mut rng).is_err());
        let moody = Pull { arm: 0, mood: Some(0.4) };
        assert!(exp.act(&main_round(false), &mut arms, moody, &ctx(), &mut rng).is_err());
        let Progress::Complete { detail, .. } = exp.act(&main_round(true), &mut arms, moody, &ctx(), &mut rng).unwrap()
        else {
            panic!("pulls complete the round")
        };
        assert_eq!(detail.mood_choice, Some(0.4));
        assert_eq!(detail.bandit_means[1], None);
    }

    #[test]
    fn at_least_two_arms_stay_available() {
        let exp = SocialComparisonBandit::new(Config { availability_change: 1.0, ..Config::default() }).unwrap();
        let mut rng = seeded_rng(43);
        let mut arms = exp.init_env(&mut rng);
        for _ in 0..1_000 {
            exp.shuffle_availability(&mut arms, &mut rng);
            assert!(arms.iter().filter(|a| a.available).count() >= 2);
        }
    }

    #[test]
    fn practice_rounds_score_nothing() {
        let exp = SocialComparisonBandit::default();
        let mut rng = seeded_rng(44);
        let mut arms = exp.init_env(&mut rng);
        let practice = ComparisonRound { number: 1, is_practice: true, asks_mood: false };
        let Progress::Complete { value, detail } = exp.act(&practice, &mut arms, Pull::arm(0), &ctx(), &mut rng).unwrap()
        else {
            panic!("pulls complete the round")
        };
        assert_eq!(value, 0.0);
        assert!(detail.is_practice);
    }
}
