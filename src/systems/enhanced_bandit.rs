//! Bandit task played side by side with a simulated agent.
//!
//! The participant and the agent face the same arms every trial. The agent
//! is a label over a fixed exploration heuristic (`BanditStrategy`) and only
//! learns from its own pulls. With dynamic rewards the arm means random-walk
//! after every trial.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::mechanics::{stats, stoch};
use crate::systems::arms::{self, BanditArm};
use crate::systems::policy::{ArmStats, BanditStrategy};
use crate::systems::sdk::{self, ChoiceRecord, Experiment, Meta, Progress, Slot, ThinkingTime, TrialContext};
use crate::{LabError, LabResult};

pub const TRIAL_OPTIONS: [usize; 4] = [50, 100, 200, 300];
pub const MIN_ARMS: usize = 2;
pub const MAX_ARMS: usize = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ComparisonMode {
    #[default]
    #[serde(alias = "human-vs-llm")]
    HumanVsAgent,
    HumanOnly,
    #[serde(alias = "llm-only")]
    AgentOnly,
}

impl ComparisonMode {
    pub fn has_human(self) -> bool {
        self != ComparisonMode::AgentOnly
    }

    pub fn has_agent(self) -> bool {
        self != ComparisonMode::HumanOnly
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardStructure {
    Static,
    #[default]
    Dynamic,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub total_trials: usize,
    pub num_bandits: usize,
    /// Agent label; picks the strategy unless `strategy` is set.
    #[serde(alias = "llmModel")]
    pub agent: String,
    pub strategy: Option<BanditStrategy>,
    pub comparison_mode: ComparisonMode,
    pub reward_structure: RewardStructure,
    pub mean_range: (f64, f64),
    pub reward_noise: f64,
    pub drift: f64,
    pub drift_bounds: (f64, f64),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            total_trials: 100,
            num_bandits: 4,
            agent: "gpt-4".into(),
            strategy: None,
            comparison_mode: ComparisonMode::default(),
            reward_structure: RewardStructure::default(),
            mean_range: (30.0, 70.0),
            reward_noise: 10.0,
            drift: 2.5,
            drift_bounds: (10.0, 90.0),
        }
    }
}

impl Config {
    pub fn validate(&self) -> LabResult<()> {
        if !TRIAL_OPTIONS.contains(&self.total_trials) {
            return Err(LabError::Config(format!(
                "totalTrials must be one of {TRIAL_OPTIONS:?}, got {}",
                self.total_trials
            )));
        }
        if !(MIN_ARMS..=MAX_ARMS).contains(&self.num_bandits) {
            return Err(LabError::Config(format!(
                "numBandits must be in {MIN_ARMS}..={MAX_ARMS}, got {}",
                self.num_bandits
            )));
        }
        Ok(())
    }

    pub fn strategy(&self) -> BanditStrategy {
        self.strategy.unwrap_or_else(|| BanditStrategy::from_label(&self.agent))
    }
}

/// Shared arms plus the agent's private view of them.
#[derive(Clone, Debug, PartialEq)]
pub struct Arena {
    pub arms: Vec<BanditArm>,
    pub agent: Vec<ArmStats>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Duel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_choice: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_choice: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_reward: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_reward: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_reaction_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_reaction_time: Option<i64>,
    /// Arm means when the choice was made.
    pub bandit_means: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub total_reward: f64,
    pub average_reward: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_reaction_time: Option<f64>,
    /// Distinct arms in the last 20 picks ÷ arm count (1 before 10 picks).
    pub exploration_rate: f64,
    /// Percent of the last 20 picks on the favourite arm.
    pub consistency: f64,
    /// Percent gain of second-half over first-half mean reward.
    pub learning_efficiency: f64,
    pub choice_counts: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human: Option<PlayerStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<PlayerStats>,
    pub agent_strategy: &'static str,
    /// Human total minus agent total, when both played.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<f64>,
}

#[derive(Clone, Debug, Default)]
pub struct EnhancedBandit {
    cfg: Config,
}

impl EnhancedBandit {
    pub fn new(cfg: Config) -> LabResult<Self> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// `round(clamp(mean + U(-noise, noise), 0, 100))`.
    fn reward<R: RngCore + ?Sized>(&self, arm: &BanditArm, rng: &mut R) -> f64 {
        (arm.mean_reward + stoch::jitter(rng, self.cfg.reward_noise))
            .clamp(0.0, 100.0)
            .round()
    }

    fn player_stats(&self, picks: &[usize], rewards: &[f64], reaction_times: &[f64]) -> PlayerStats {
        let mut choice_counts = vec![0; self.cfg.num_bandits];
        for &p in picks {
            if let Some(c) = choice_counts.get_mut(p) {
                *c += 1;
            }
        }
        PlayerStats {
            total_reward: rewards.iter().sum(),
            average_reward: stats::mean_or_zero(rewards),
            average_reaction_time: stats::mean(reaction_times),
            exploration_rate: stats::exploration_rate(picks, self.cfg.num_bandits, 20, 10),
            consistency: stats::consistency(picks, 20, 10),
            learning_efficiency: stats::learning_gain(rewards, 20),
            choice_counts,
        }
    }
}

impl Experiment for EnhancedBandit {
    type Trial = Slot;
    /// Human pick (0-based); `None` in agent-only mode.
    type Choice = Option<usize>;
    type Detail = Duel;
    type Env = Arena;
    type Summary = Summary;

    fn meta(&self) -> Meta {
        Meta {
            slug: "enhanced-bandit-task",
            name: "Enhanced Bandit Task",
            records_key: "trialData",
            index_key: "trial",
            total_key: "totalTrials",
        }
    }

    fn total_trials(&self) -> usize {
        self.cfg.total_trials
    }

    fn generate_trials(&self, _rng: &mut dyn RngCore) -> Vec<Slot> {
        sdk::slots(self.cfg.total_trials)
    }

    fn init_env(&self, rng: &mut dyn RngCore) -> Arena {
        let (lo, hi) = self.cfg.mean_range;
        Arena {
            arms: arms::uniform_arms(rng, self.cfg.num_bandits, lo, hi),
            agent: vec![ArmStats::default(); self.cfg.num_bandits],
        }
    }

    fn act(
        &self,
        _trial: &Slot,
        arena: &mut Arena,
        pick: Option<usize>,
        ctx: &TrialContext<'_, Duel>,
        rng: &mut dyn RngCore,
    ) -> LabResult<Progress<Duel>> {
        let mode = self.cfg.comparison_mode;
        let human = match (mode.has_human(), pick) {
            (true, Some(i)) if i < arena.arms.len() => Some(i),
            (true, Some(i)) => return Err(LabError::InvalidChoice(format!("no arm {i}"))),
            (true, None) => return Err(LabError::InvalidChoice("a pick is required".into())),
            (false, Some(_)) => {
                return Err(LabError::InvalidChoice("agent-only trials take no pick".into()));
            }
            (false, None) => None,
        };
        let bandit_means: Vec<f64> = arena.arms.iter().map(|a| a.mean_reward).collect();

        let mut human_reward = None;
        if let Some(i) = human {
            let r = self.reward(&arena.arms[i], rng);
            arena.arms[i].record(r);
            human_reward = Some(r);
        }

        let (mut agent_choice, mut agent_reward, mut agent_reaction_time) = (None, None, None);
        if mode.has_agent() {
            let j = self.cfg.strategy().choose(&arena.agent, ctx.index, rng);
            let r = self.reward(&arena.arms[j], rng);
            arena.agent[j].record(r);
            agent_choice = Some(j);
            agent_reward = Some(r);
            agent_reaction_time = self.thinking_time().map(|t| t.draw(rng));
        }

        if self.cfg.reward_structure == RewardStructure::Dynamic {
            let (lo, hi) = self.cfg.drift_bounds;
            for arm in arena.arms.iter_mut() {
                arm.drift(rng, self.cfg.drift, lo, hi);
            }
        }

        let value = human_reward.or(agent_reward).unwrap_or(0.0);
        Ok(Progress::Complete {
            value,
            detail: Duel {
                human_choice: human,
                agent_choice,
                human_reward,
                agent_reward,
                human_reaction_time: human.map(|_| ctx.now_ms - ctx.trial_started_ms),
                agent_reaction_time,
                bandit_means,
            },
        })
    }

    fn summarize(&self, history: &[ChoiceRecord<Duel>]) -> Summary {
        let mode = self.cfg.comparison_mode;
        let side = |choice: fn(&Duel) -> Option<usize>, reward: fn(&Duel) -> Option<f64>| {
            let picks: Vec<usize> = history.iter().filter_map(|r| choice(&r.detail)).collect();
            let rewards: Vec<f64> = history.iter().filter_map(|r| reward(&r.detail)).collect();
            (picks, rewards)
        };
        let human = mode.has_human().then(|| {
            let (picks, rewards) = side(|d| d.human_choice, |d| d.human_reward);
            let rts: Vec<f64> = history
                .iter()
                .filter_map(|r| r.detail.human_reaction_time)
                .map(|t| t as f64)
                .collect();
            self.player_stats(&picks, &rewards, &rts)
        });
        let agent = mode.has_agent().then(|| {
            let (picks, rewards) = side(|d| d.agent_choice, |d| d.agent_reward);
            self.player_stats(&picks, &rewards, &[])
        });
        let difference = match (&human, &agent) {
            (Some(h), Some(a)) => Some(h.total_reward - a.total_reward),
            _ => None,
        };
        Summary { human, agent, agent_strategy: self.cfg.strategy().describe(), difference }
    }

    fn thinking_time(&self) -> Option<ThinkingTime> {
        self.cfg
            .comparison_mode
            .has_agent()
            .then_some(ThinkingTime::between(1000, 3000))
    }
}
