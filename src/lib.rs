/*!
`decision_lab`: a pure, seedable session engine for behavioral-economics experiments.

What it does
- Runs one generic sequential-trial loop (instruction → playing → finished)
  for every experiment in the catalog.
- Composes caller-independent pure pieces per experiment
  (`generate_trials : Config×Rng→[Trial]`, `act : Trial×Env×Choice→Progress`,
  `summarize : [Record]→Summary`) into a single reducer
  `reduce(state, event) -> state`.
- Serializes a finished (or partial) run into the JSON export document.

How to use (call surface only)
- Pick an experiment from `systems::*` and build it from its `Config`.
- Wrap it in a `systems::sdk::Session` with a seed and a `clock::Clock`.
- Call `start`, then `act(choice)` once per user action until the phase is
  `Phase::Finished`; read `summary()` or `export::export_document`.

What it does NOT do
- No rendering, no persistence, no network. Randomness is always injected.
*/

pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod mechanics;
pub mod suites;
pub mod systems;

pub use error::{LabError, LabResult};

use serde::{Deserialize, Serialize};

/// Session phase. Transitions are monotonic except for `Reset`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Instruction,
    Playing,
    Finished,
}

/// Phase-level signal emitted by the reducer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Signal {
    Start,
    Complete,
    Reset,
}

impl Phase {
    /// instruction --Start--> playing --Complete--> finished; Reset from anywhere.
    pub fn next(self, signal: Signal) -> Option<Phase> {
        match (self, signal) {
            (_, Signal::Reset) => Some(Phase::Instruction),
            (Phase::Instruction, Signal::Start) => Some(Phase::Playing),
            (Phase::Playing, Signal::Complete) => Some(Phase::Finished),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Instruction => "instruction",
            Phase::Playing => "playing",
            Phase::Finished => "finished",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RNG used across the crate.
pub type LabRng = bevy_prng::WyRand;

/// Seeded RNG; equal seeds replay identical runs.
pub fn seeded_rng(seed: u64) -> LabRng {
    use rand_core::SeedableRng;
    LabRng::from_seed(seed.to_le_bytes())
}
