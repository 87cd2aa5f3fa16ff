pub mod sdk;
pub mod policy;
pub mod arms;

#[cfg(feature = "exp-choice-tasks")]  pub mod iowa_gambling;
#[cfg(feature = "exp-choice-tasks")]  pub mod balloon_risk;
#[cfg(feature = "exp-choice-tasks")]  pub mod delay_discounting;
#[cfg(feature = "exp-choice-tasks")]  pub mod social_discounting;
#[cfg(feature = "exp-choice-tasks")]  pub mod framing_effect;
#[cfg(feature = "exp-choice-tasks")]  pub mod trolley;

#[cfg(feature = "exp-matrix-games")]  pub mod matrix_games;

#[cfg(feature = "exp-allocation")]    pub mod dictator;
#[cfg(feature = "exp-allocation")]    pub mod ultimatum;
#[cfg(feature = "exp-allocation")]    pub mod trust;
#[cfg(feature = "exp-allocation")]    pub mod public_goods;
#[cfg(feature = "exp-allocation")]    pub mod third_party_punishment;

#[cfg(feature = "exp-bandits")]       pub mod bandit;
#[cfg(feature = "exp-bandits")]       pub mod enhanced_bandit;
#[cfg(feature = "exp-bandits")]       pub mod social_comparison_bandit;
