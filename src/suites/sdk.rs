// src/suites/sdk.rs

//! # Suite SDK
//!
//! Glue for running experiments end to end without a user in the loop:
//! scripted participants for simulations, smoke tests and demos.
//!
//! A *script* is any `FnMut(&SessionState<E>) -> E::Choice`. It sees the
//! whole state (current trial, history, environment) and answers for the
//! participant. `run_scripted` starts the session if needed and feeds the
//! script until the session finishes or the step budget runs out.
//!
//! `run_seeds` repeats a fresh run per seed and collects the summaries,
//! which is how population-level properties (e.g. mean pumps before a pop)
//! are checked.

use tracing::warn;

use crate::clock::Clock;
use crate::systems::sdk::{Experiment, Session, SessionState};
use crate::{LabResult, Phase};

/// Outcome of one scripted run.
#[derive(Clone, Debug)]
pub struct Run<S> {
    pub steps: usize,
    pub finished: bool,
    pub score: f64,
    pub summary: S,
}

/// Drive `session` with `script` until it finishes or `max_steps` actions
/// have been taken. Script errors (invalid choices) abort the run.
pub fn run_scripted<E, C, F>(session: &mut Session<E, C>, max_steps: usize, mut script: F) -> LabResult<Run<E::Summary>>
where
    E: Experiment,
    C: Clock,
    F: FnMut(&SessionState<E>) -> E::Choice,
{
    if session.phase() == Phase::Instruction {
        session.start()?;
    }
    let mut steps = 0;
    while session.phase() == Phase::Playing && steps < max_steps {
        let choice = script(session.state());
        session.act(choice)?;
        steps += 1;
    }
    let finished = session.phase() == Phase::Finished;
    if !finished {
        warn!(
            experiment = session.experiment().meta().slug,
            steps,
            trial = session.state().current_trial,
            "step budget exhausted before the session finished"
        );
    }
    Ok(Run { steps, finished, score: session.state().cumulative_score, summary: session.summary() })
}

/// One fresh session per seed, each driven by a clone of `script`.
pub fn run_seeds<E, C, F>(
    seeds: impl IntoIterator<Item = u64>,
    mut make: impl FnMut(u64) -> Session<E, C>,
    max_steps: usize,
    script: F,
) -> LabResult<Vec<Run<E::Summary>>>
where
    E: Experiment,
    C: Clock,
    F: FnMut(&SessionState<E>) -> E::Choice + Clone,
{
    seeds
        .into_iter()
        .map(|seed| run_scripted(&mut make(seed), max_steps, script.clone()))
        .collect()
}
