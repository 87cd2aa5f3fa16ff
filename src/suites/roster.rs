//! Team roster shown alongside the catalog. Loading never fails: a missing
//! or malformed file falls back to the built-in roster with a warning.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::LabResult;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Social {
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamMember {
    pub name: String,
    pub role: String,
    pub image: Option<String>,
    pub bio: String,
    pub social: Social,
}

/// Roster used when the file cannot be read.
pub fn default_roster() -> Vec<TeamMember> {
    vec![TeamMember {
        name: "Prof. Zhang".into(),
        role: "Principal investigator, cognitive science".into(),
        image: None,
        bio: "Studies human decision processes and cognitive bias.".into(),
        social: Social { email: Some("zhang@cognixai.research".into()), ..Social::default() },
    }]
}

pub fn parse_roster(s: &str) -> LabResult<Vec<TeamMember>> {
    Ok(serde_json::from_str(s)?)
}

pub fn load_roster(path: impl AsRef<Path>) -> Vec<TeamMember> {
    let path = path.as_ref();
    let loaded = std::fs::read_to_string(path)
        .map_err(crate::LabError::from)
        .and_then(|text| parse_roster(&text));
    match loaded {
        Ok(members) => members,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to load team roster, using default");
            default_roster()
        }
    }
}
