//! Experiment catalog: the list of experiments, their metadata records and
//! the URL routes that reach them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{LabError, LabResult};

/// Most results a search returns.
pub const SEARCH_LIMIT: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    ChoiceTasks,
    MatrixGames,
    Allocation,
    Bandits,
}

impl Family {
    /// Whether the cargo feature for this family is on.
    pub fn is_enabled(self) -> bool {
        match self {
            Family::ChoiceTasks => cfg!(feature = "exp-choice-tasks"),
            Family::MatrixGames => cfg!(feature = "exp-matrix-games"),
            Family::Allocation => cfg!(feature = "exp-allocation"),
            Family::Bandits => cfg!(feature = "exp-bandits"),
        }
    }
}

macro_rules! kinds {
    ($( $variant:ident => $slug:literal, $name:literal, $family:ident; )*) => {
        /// Every experiment the lab knows, by slug.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum ExperimentKind {
            $( #[serde(rename = $slug)] $variant, )*
        }

        impl ExperimentKind {
            pub const ALL: &'static [ExperimentKind] = &[$(ExperimentKind::$variant),*];

            pub fn slug(self) -> &'static str {
                match self { $(ExperimentKind::$variant => $slug,)* }
            }

            pub fn name(self) -> &'static str {
                match self { $(ExperimentKind::$variant => $name,)* }
            }

            pub fn family(self) -> Family {
                match self { $(ExperimentKind::$variant => Family::$family,)* }
            }
        }
    };
}

kinds! {
    IowaGambling => "iowa-gambling-task", "Iowa Gambling Task", ChoiceTasks;
    BalloonRisk => "balloon-risk-task", "Balloon Analog Risk Task", ChoiceTasks;
    DelayDiscounting => "delay-discounting-task", "Delay Discounting Task", ChoiceTasks;
    SocialDiscounting => "social-discounting-task", "Social Discounting Task", ChoiceTasks;
    FramingEffect => "framing-effect-tasks", "Framing Effect Tasks", ChoiceTasks;
    Trolley => "trolley-problem", "Trolley Problem", ChoiceTasks;
    PrisonersDilemma => "prisoners-dilemma", "Prisoner's Dilemma", MatrixGames;
    Chicken => "chicken-game", "Chicken Game", MatrixGames;
    StagHunt => "stag-hunt", "Stag Hunt", MatrixGames;
    Dictator => "dictator-game", "Dictator Game", Allocation;
    Ultimatum => "ultimatum-game", "Ultimatum Game", Allocation;
    Trust => "trust-game", "Trust Game", Allocation;
    PublicGoods => "public-goods-game", "Public Goods Game", Allocation;
    ThirdPartyPunishment => "third-party-punishment", "Third-Party Punishment", Allocation;
    MultiArmedBandit => "multi-armed-bandit-task", "Multi-Armed Bandit Task", Bandits;
    EnhancedBandit => "enhanced-bandit-task", "Enhanced Bandit Task", Bandits;
    SocialComparisonBandit => "reward-social-comparison-bandit-task", "Reward Social Comparison Bandit Task", Bandits;
}

impl ExperimentKind {
    /// Kinds compiled into this build.
    pub fn enabled() -> impl Iterator<Item = ExperimentKind> {
        Self::ALL.iter().copied().filter(|k| k.family().is_enabled())
    }
}

impl FromStr for ExperimentKind {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.slug() == s)
            .ok_or_else(|| LabError::UnknownExperiment(s.to_owned()))
    }
}

impl fmt::Display for ExperimentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Where a path leads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    /// `/experiments`
    Experiments,
    /// `/experiments/<slug>`: run the experiment.
    Run(ExperimentKind),
    /// `/experiments/<id>`: metadata page.
    Detail(u32),
    NotFound,
}

impl Route {
    /// Query strings, fragments and trailing slashes are ignored.
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Home,
            ["experiments"] => Route::Experiments,
            ["experiments", rest] => {
                if let Ok(kind) = rest.parse::<ExperimentKind>() {
                    Route::Run(kind)
                } else if let Ok(id) = rest.parse::<u32>() {
                    Route::Detail(id)
                } else {
                    Route::NotFound
                }
            }
            _ => Route::NotFound,
        }
    }
}

/// Metadata record of one catalog entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: u32,
    pub title: String,
    pub authors: String,
    pub description: String,
    pub category: String,
    pub tags: Vec<String>,
    pub duration: String,
    pub difficulty: String,
    pub citations: u32,
    pub is_popular: bool,
    pub version: String,
    pub release_date: String,
    pub last_updated: String,
    pub related_papers: Vec<String>,
    pub license: String,
    pub repository: String,
    pub contact_info: String,
    pub experiment_path: Option<String>,
}

impl CatalogEntry {
    /// Experiment behind `experiment_path`, if it routes to one.
    pub fn kind(&self) -> Option<ExperimentKind> {
        match Route::parse(self.experiment_path.as_deref()?) {
            Route::Run(kind) => Some(kind),
            _ => None,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        [&self.title, &self.authors, &self.description]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub experiments: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn from_json_str(s: &str) -> LabResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn find(&self, id: u32) -> LabResult<&CatalogEntry> {
        self.experiments
            .iter()
            .find(|e| e.id == id)
            .ok_or(LabError::NotFound(id))
    }

    /// Case-insensitive substring match on title, authors and description,
    /// filtered by category (`"all"` keeps everything), first
    /// `SEARCH_LIMIT` hits in catalog order.
    pub fn search(&self, term: &str, category: &str) -> Vec<&CatalogEntry> {
        let needle = term.to_lowercase();
        self.experiments
            .iter()
            .filter(|e| category == "all" || e.category == category)
            .filter(|e| e.matches(&needle))
            .take(SEARCH_LIMIT)
            .collect()
    }

    /// Resolve a path to a metadata entry (`Detail`) or an experiment (`Run`).
    pub fn resolve(&self, path: &str) -> LabResult<Route> {
        match Route::parse(path) {
            Route::Detail(id) => self.find(id).map(|_| Route::Detail(id)),
            Route::Run(kind) if !kind.family().is_enabled() => {
                Err(LabError::UnknownExperiment(kind.slug().to_owned()))
            }
            Route::NotFound => Err(LabError::UnknownExperiment(path.to_owned())),
            route => Ok(route),
        }
    }
}
