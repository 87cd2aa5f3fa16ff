//! Lab-wide configuration: an optional seed plus per-experiment overrides,
//! keyed by experiment slug. Every field defaults, so `{}` is a valid file.
//!
//! ```json
//! { "seed": 7, "experiments": { "dictator-game": { "rounds": 10 } } }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::LabResult;
use crate::suites::roster::{self, TeamMember};
#[cfg(feature = "exp-allocation")]
use crate::systems::{dictator, public_goods, third_party_punishment, trust, ultimatum};
#[cfg(feature = "exp-bandits")]
use crate::systems::{bandit, enhanced_bandit, social_comparison_bandit};
#[cfg(feature = "exp-choice-tasks")]
use crate::systems::{balloon_risk, delay_discounting, framing_effect, iowa_gambling, social_discounting, trolley};
#[cfg(feature = "exp-matrix-games")]
use crate::systems::matrix_games;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabConfig {
    /// Fixed seed for reproducible runs; fresh entropy when absent.
    pub seed: Option<u64>,
    /// Team roster file, see `suites::roster`.
    pub roster_path: Option<PathBuf>,
    pub experiments: Overrides,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Overrides {
    #[cfg(feature = "exp-choice-tasks")]
    #[serde(rename = "iowa-gambling-task")]
    pub iowa_gambling: iowa_gambling::Config,
    #[cfg(feature = "exp-choice-tasks")]
    #[serde(rename = "balloon-risk-task")]
    pub balloon_risk: balloon_risk::Config,
    #[cfg(feature = "exp-choice-tasks")]
    #[serde(rename = "delay-discounting-task")]
    pub delay_discounting: delay_discounting::Config,
    #[cfg(feature = "exp-choice-tasks")]
    #[serde(rename = "social-discounting-task")]
    pub social_discounting: social_discounting::Config,
    #[cfg(feature = "exp-choice-tasks")]
    #[serde(rename = "framing-effect-tasks")]
    pub framing_effect: framing_effect::Config,
    #[cfg(feature = "exp-choice-tasks")]
    #[serde(rename = "trolley-problem")]
    pub trolley: trolley::Config,

    #[cfg(feature = "exp-matrix-games")]
    #[serde(rename = "prisoners-dilemma")]
    pub prisoners_dilemma: matrix_games::Config,
    #[cfg(feature = "exp-matrix-games")]
    #[serde(rename = "chicken-game")]
    pub chicken: matrix_games::Config,
    #[cfg(feature = "exp-matrix-games")]
    #[serde(rename = "stag-hunt")]
    pub stag_hunt: matrix_games::Config,

    #[cfg(feature = "exp-allocation")]
    #[serde(rename = "dictator-game")]
    pub dictator: dictator::Config,
    #[cfg(feature = "exp-allocation")]
    #[serde(rename = "ultimatum-game")]
    pub ultimatum: ultimatum::Config,
    #[cfg(feature = "exp-allocation")]
    #[serde(rename = "trust-game")]
    pub trust: trust::Config,
    #[cfg(feature = "exp-allocation")]
    #[serde(rename = "public-goods-game")]
    pub public_goods: public_goods::Config,
    #[cfg(feature = "exp-allocation")]
    #[serde(rename = "third-party-punishment")]
    pub third_party_punishment: third_party_punishment::Config,

    #[cfg(feature = "exp-bandits")]
    #[serde(rename = "multi-armed-bandit-task")]
    pub bandit: bandit::Config,
    #[cfg(feature = "exp-bandits")]
    #[serde(rename = "enhanced-bandit-task")]
    pub enhanced_bandit: enhanced_bandit::Config,
    #[cfg(feature = "exp-bandits")]
    #[serde(rename = "reward-social-comparison-bandit-task")]
    pub social_comparison_bandit: social_comparison_bandit::Config,
}

impl LabConfig {
    pub fn from_json_str(s: &str) -> LabResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> LabResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let cfg = Self::from_json_str(&text)?;
        debug!(path = %path.display(), seed = ?cfg.seed, "loaded lab config");
        Ok(cfg)
    }

    /// Reject overrides the experiments themselves would refuse.
    pub fn validate(&self) -> LabResult<()> {
        #[cfg(feature = "exp-bandits")]
        {
            self.experiments.enhanced_bandit.validate()?;
            self.experiments.social_comparison_bandit.validate()?;
        }
        Ok(())
    }

    /// Team roster from `roster_path`, or the built-in one when unset.
    pub fn roster(&self) -> Vec<TeamMember> {
        match &self.roster_path {
            Some(path) => roster::load_roster(path),
            None => roster::default_roster(),
        }
    }

    /// Configured seed, else one from the wall clock.
    pub fn seed_or_entropy(&self) -> u64 {
        self.seed
            .unwrap_or_else(|| chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_all_defaults() {
        let cfg = LabConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, LabConfig::default());
        assert_eq!(cfg.seed, None);
    }

    #[cfg(feature = "exp-allocation")]
    #[test]
    fn overrides_are_keyed_by_slug_and_partial() {
        let cfg = LabConfig::from_json_str(
            r#"{ "seed": 7, "experiments": { "dictator-game": { "rounds": 5 } } }"#,
        )
        .unwrap();
        assert_eq!(cfg.seed_or_entropy(), 7);
        assert_eq!(cfg.experiments.dictator.rounds, 5);
        assert_eq!(cfg.experiments.dictator.total_amount, 100.0);
    }

    #[cfg(feature = "exp-bandits")]
    #[test]
    fn invalid_bandit_overrides_are_rejected() {
        let bad = r#"{ "experiments": { "enhanced-bandit-task": { "totalTrials": 75 } } }"#;
        assert!(matches!(LabConfig::from_json_str(bad), Err(crate::LabError::Config(_))));
        let bad_study = r#"{ "experiments": { "reward-social-comparison-bandit-task": { "studyId": 9 } } }"#;
        assert!(LabConfig::from_json_str(bad_study).is_err());
    }

    #[cfg(feature = "exp-bandits")]
    #[test]
    fn zero_available_arms_is_rejected() {
        let bad = r#"{ "experiments": { "reward-social-comparison-bandit-task": { "minAvailable": 0 } } }"#;
        assert!(matches!(LabConfig::from_json_str(bad), Err(crate::LabError::Config(_))));
    }

    #[test]
    fn roster_comes_from_the_configured_file() {
        assert_eq!(LabConfig::default().roster(), roster::default_roster());

        let missing = LabConfig { roster_path: Some("/no/such/team.json".into()), ..LabConfig::default() };
        assert_eq!(missing.roster(), roster::default_roster());

        let path = std::env::temp_dir().join(format!("decision-lab-team-{}.json", std::process::id()));
        std::fs::write(&path, r#"[{ "name": "Lee", "role": "RA", "bio": "Runs sessions." }]"#).unwrap();
        let cfg = LabConfig { roster_path: Some(path.clone()), ..LabConfig::default() };
        let members = cfg.roster();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "Lee");
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        assert!(matches!(LabConfig::from_json_str("{ seed: "), Err(crate::LabError::Json(_))));
    }
}
