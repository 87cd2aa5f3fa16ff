// src/systems/sdk.rs

//! # Systems SDK
//!
//! One generic session loop shared by every experiment. An *experiment*
//! supplies pure pieces (trial generator, outcome function, opponent or
//! environment policy, summary) and this module drives them through the
//! `instruction → playing → finished` phases.
//!
//! ## What an experiment implements
//! 1) **generate_trials**: `(&self, rng) -> Vec<Trial>`
//!    - Exactly `total_trials()` entries. Re-invoked on every reset.
//!
//! 2) **init_env**: `(&self, rng) -> Env`
//!    - Mutable per-run state that is *not* history: balloon pumps so far,
//!      bandit arms, the counterpart offer drawn at trial start.
//!
//! 3) **begin_trial** (optional): `(&self, &Trial, &mut Env, ctx, rng)`
//!    - Runs when a trial opens. Counterparts that move first draw here.
//!
//! 4) **act**: `(&self, &Trial, &mut Env, Choice, ctx, rng) -> Progress`
//!    - One participant action. `Progress::Continue` keeps the trial open,
//!      `Progress::Complete` closes it with an outcome value and a detail row.
//!    - Reject wrong-kind choices with `LabError::InvalidChoice` and
//!      out-of-range inputs with `LabError::OutOfRange`.
//!
//! 5) **summarize**: `(&self, &[ChoiceRecord]) -> Summary`
//!    - Pure function of history. Never stored.
//!
//! ## Loop invariants
//! - `history.len() == current_trial` after every event.
//! - `current_trial` grows by one per completed trial and stops at N,
//!   where the phase becomes `Finished`.
//! - A failed event leaves the state untouched (`reduce` works on a copy).
//! - `Reset` is accepted from any phase and bumps `generation`.
//!
//! ## Hooks
//! `Hook<D>` observes completed records and phase changes without touching
//! the loop (loggers, live charts, autosave buffers).
//!
//! ## Thinking time
//! Counterparts may "think" before revealing a move. `Session::submit`
//! returns a `Ticket` stamped with the current generation and a due time;
//! `Session::resolve` applies it. A ticket from before a reset resolves to
//! nothing.

use rand_core::RngCore;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::mechanics::stoch;
use crate::{LabError, LabResult, LabRng, Phase, Signal};

/// Names an experiment uses in logs and exports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Meta {
    /// URL/file slug, e.g. `dictator-game`.
    pub slug: &'static str,
    /// Display name written to `experimentInfo.name`.
    pub name: &'static str,
    /// Key of the records array in the export (`trials`, `rounds`, ...).
    pub records_key: &'static str,
    /// 1-based index field of each exported record (`trial`, `round`).
    pub index_key: &'static str,
    /// Trial-count field of `experimentInfo` (`totalTrials`, `totalRounds`).
    pub total_key: &'static str,
}

/// Result of one participant action.
#[derive(Clone, Debug, PartialEq)]
pub enum Progress<D> {
    /// Trial stays open (e.g. a balloon pump that did not pop).
    Continue,
    /// Trial closes with this outcome.
    Complete { value: f64, detail: D },
}

/// One history row. Appended exactly once per completed trial.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChoiceRecord<D> {
    pub trial_index: usize,
    pub outcome_value: f64,
    pub timestamp_ms: i64,
    pub detail: D,
}

/// What an outcome function may look at besides the trial itself.
#[derive(Clone, Debug)]
pub struct TrialContext<'a, D> {
    pub index: usize,
    pub trial_started_ms: i64,
    pub now_ms: i64,
    pub history: &'a [ChoiceRecord<D>],
}

/// Counterpart delay range in milliseconds (inclusive).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThinkingTime {
    pub min_ms: i64,
    pub max_ms: i64,
}

impl ThinkingTime {
    pub const fn fixed(ms: i64) -> Self {
        Self { min_ms: ms, max_ms: ms }
    }

    pub const fn between(min_ms: i64, max_ms: i64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn draw<R: RngCore + ?Sized>(&self, rng: &mut R) -> i64 {
        if self.max_ms <= self.min_ms {
            return self.min_ms;
        }
        self.min_ms + stoch::uniform(rng, 0.0, (self.max_ms - self.min_ms) as f64).round() as i64
    }
}

pub trait Experiment {
    type Trial: Clone + std::fmt::Debug + Serialize;
    type Choice: std::fmt::Debug;
    type Detail: Clone + std::fmt::Debug + Serialize;
    type Env: Clone + std::fmt::Debug;
    type Summary: Clone + std::fmt::Debug + Serialize;

    fn meta(&self) -> Meta;

    fn total_trials(&self) -> usize;

    fn generate_trials(&self, rng: &mut dyn RngCore) -> Vec<Self::Trial>;

    fn init_env(&self, rng: &mut dyn RngCore) -> Self::Env;

    fn begin_trial(
        &self,
        _trial: &Self::Trial,
        _env: &mut Self::Env,
        _ctx: &TrialContext<'_, Self::Detail>,
        _rng: &mut dyn RngCore,
    ) {
    }

    fn act(
        &self,
        trial: &Self::Trial,
        env: &mut Self::Env,
        choice: Self::Choice,
        ctx: &TrialContext<'_, Self::Detail>,
        rng: &mut dyn RngCore,
    ) -> LabResult<Progress<Self::Detail>>;

    fn summarize(&self, history: &[ChoiceRecord<Self::Detail>]) -> Self::Summary;

    /// Cosmetic counterpart delay, if the experiment has one.
    fn thinking_time(&self) -> Option<ThinkingTime> {
        None
    }
}

/// Complete session state. Replaced wholesale by `reduce`.
pub struct SessionState<E: Experiment> {
    pub phase: Phase,
    pub trials: Vec<E::Trial>,
    pub current_trial: usize,
    pub cumulative_score: f64,
    pub history: Vec<ChoiceRecord<E::Detail>>,
    pub started_ms: Option<i64>,
    pub ended_ms: Option<i64>,
    pub trial_started_ms: Option<i64>,
    pub env: E::Env,
    pub generation: u64,
}

// Manual impls: derives would demand `E: Clone + Debug`.
impl<E: Experiment> Clone for SessionState<E> {
    fn clone(&self) -> Self {
        Self {
            phase: self.phase,
            trials: self.trials.clone(),
            current_trial: self.current_trial,
            cumulative_score: self.cumulative_score,
            history: self.history.clone(),
            started_ms: self.started_ms,
            ended_ms: self.ended_ms,
            trial_started_ms: self.trial_started_ms,
            env: self.env.clone(),
            generation: self.generation,
        }
    }
}

impl<E: Experiment> std::fmt::Debug for SessionState<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("phase", &self.phase)
            .field("current_trial", &self.current_trial)
            .field("total_trials", &self.trials.len())
            .field("cumulative_score", &self.cumulative_score)
            .field("history", &self.history)
            .field("env", &self.env)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<E: Experiment> SessionState<E> {
    /// Fresh state in `Instruction` with newly generated trials.
    pub fn new(exp: &E, rng: &mut dyn RngCore) -> Self {
        Self::fresh(exp, rng, 0)
    }

    fn fresh(exp: &E, rng: &mut dyn RngCore, generation: u64) -> Self {
        let trials = exp.generate_trials(rng);
        let env = exp.init_env(rng);
        Self {
            phase: Phase::Instruction,
            trials,
            current_trial: 0,
            cumulative_score: 0.0,
            history: Vec::new(),
            started_ms: None,
            ended_ms: None,
            trial_started_ms: None,
            env,
            generation,
        }
    }

    /// Trial awaiting a choice, if playing.
    pub fn current(&self) -> Option<&E::Trial> {
        match self.phase {
            Phase::Playing => self.trials.get(self.current_trial),
            _ => None,
        }
    }

    pub fn total_trials(&self) -> usize {
        self.trials.len()
    }

    fn context(&self, now_ms: i64) -> TrialContext<'_, E::Detail> {
        TrialContext {
            index: self.current_trial,
            trial_started_ms: self.trial_started_ms.unwrap_or(now_ms),
            now_ms,
            history: &self.history,
        }
    }

    fn open_trial(&mut self, exp: &E, now_ms: i64, rng: &mut dyn RngCore) {
        self.trial_started_ms = Some(now_ms);
        let Some(trial) = self.trials.get(self.current_trial).cloned() else {
            return;
        };
        let mut env = self.env.clone();
        exp.begin_trial(&trial, &mut env, &self.context(now_ms), rng);
        self.env = env;
    }
}

/// Inputs to the reducer.
#[derive(Clone, Debug)]
pub enum Event<C> {
    Start { now_ms: i64 },
    Act { choice: C, now_ms: i64 },
    Reset,
}

/// Pure transition: `(state, event) -> state'`. Errors leave `state` as it was.
pub fn reduce<E: Experiment>(
    exp: &E,
    state: &SessionState<E>,
    event: Event<E::Choice>,
    rng: &mut dyn RngCore,
) -> LabResult<SessionState<E>> {
    match event {
        Event::Reset => Ok(SessionState::fresh(exp, rng, state.generation + 1)),
        Event::Start { now_ms } => {
            let phase = state
                .phase
                .next(Signal::Start)
                .ok_or(LabError::Phase { action: "start", phase: state.phase })?;
            let mut next = state.clone();
            next.phase = phase;
            next.started_ms = Some(now_ms);
            if next.trials.is_empty() {
                next.phase = Phase::Finished;
                next.ended_ms = Some(now_ms);
            } else {
                next.open_trial(exp, now_ms, rng);
            }
            Ok(next)
        }
        Event::Act { choice, now_ms } => {
            if state.phase != Phase::Playing {
                return Err(LabError::Phase { action: "act", phase: state.phase });
            }
            let trial = state
                .trials
                .get(state.current_trial)
                .ok_or(LabError::Phase { action: "act", phase: state.phase })?;
            let mut env = state.env.clone();
            let progress = exp.act(trial, &mut env, choice, &state.context(now_ms), rng)?;

            let mut next = state.clone();
            next.env = env;
            if let Progress::Complete { value, detail } = progress {
                next.history.push(ChoiceRecord {
                    trial_index: next.current_trial,
                    outcome_value: value,
                    timestamp_ms: now_ms,
                    detail,
                });
                next.cumulative_score += value;
                next.current_trial += 1;
                if next.current_trial >= next.trials.len() {
                    next.phase = next.phase.next(Signal::Complete).unwrap_or(Phase::Finished);
                    next.ended_ms = Some(now_ms);
                    next.trial_started_ms = None;
                } else {
                    next.open_trial(exp, now_ms, rng);
                }
            }
            Ok(next)
        }
    }
}

/// Observer of session progress.
pub trait Hook<D> {
    /// (Optional) called once per appended record.
    fn on_record(&mut self, _record: &ChoiceRecord<D>) {}
    /// (Optional) called on every phase change, including reset.
    fn on_phase_change(&mut self, _from: Phase, _to: Phase) {}
}

/// A deferred participant action waiting out the counterpart's thinking time.
#[derive(Clone, Debug)]
pub struct Ticket<C> {
    pub generation: u64,
    pub due_ms: i64,
    pub choice: C,
}

/// Stateful driver around `reduce`: owns the RNG, clock and hooks.
pub struct Session<E: Experiment, C: Clock> {
    exp: E,
    state: SessionState<E>,
    rng: LabRng,
    clock: C,
    hooks: Vec<Box<dyn Hook<E::Detail>>>,
}

impl<E: Experiment, C: Clock> Session<E, C> {
    pub fn new(exp: E, seed: u64, clock: C) -> Self {
        Self::with_rng(exp, crate::seeded_rng(seed), clock)
    }

    pub fn with_rng(exp: E, mut rng: LabRng, clock: C) -> Self {
        let state = SessionState::new(&exp, &mut rng);
        Self { exp, state, rng, clock, hooks: Vec::new() }
    }

    pub fn add_hook(&mut self, hook: Box<dyn Hook<E::Detail>>) {
        self.hooks.push(hook);
    }

    pub fn experiment(&self) -> &E {
        &self.exp
    }

    pub fn state(&self) -> &SessionState<E> {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn history(&self) -> &[ChoiceRecord<E::Detail>] {
        &self.state.history
    }

    pub fn current_trial(&self) -> Option<&E::Trial> {
        self.state.current()
    }

    pub fn summary(&self) -> E::Summary {
        self.exp.summarize(&self.state.history)
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn start(&mut self) -> LabResult<()> {
        let now_ms = self.clock.now_ms();
        self.apply(Event::Start { now_ms })?;
        info!(experiment = self.exp.meta().slug, trials = self.state.trials.len(), "session started");
        Ok(())
    }

    /// Apply one action now. Returns the record if the trial completed.
    pub fn act(&mut self, choice: E::Choice) -> LabResult<Option<ChoiceRecord<E::Detail>>> {
        let now_ms = self.clock.now_ms();
        let before = self.state.history.len();
        self.apply(Event::Act { choice, now_ms })?;
        Ok(self.state.history.get(before).cloned())
    }

    pub fn reset(&mut self) -> LabResult<()> {
        self.apply(Event::Reset)?;
        info!(experiment = self.exp.meta().slug, generation = self.state.generation, "session reset");
        Ok(())
    }

    /// Queue an action behind the counterpart's thinking time.
    pub fn submit(&mut self, choice: E::Choice) -> LabResult<Ticket<E::Choice>> {
        if self.state.phase != Phase::Playing {
            return Err(LabError::Phase { action: "submit", phase: self.state.phase });
        }
        let delay = self.exp.thinking_time().map_or(0, |t| t.draw(&mut self.rng));
        Ok(Ticket {
            generation: self.state.generation,
            due_ms: self.clock.now_ms() + delay,
            choice,
        })
    }

    pub fn is_due(&self, ticket: &Ticket<E::Choice>) -> bool {
        self.clock.now_ms() >= ticket.due_ms
    }

    /// Apply a queued action. Stale tickets (from before a reset) are dropped.
    pub fn resolve(&mut self, ticket: Ticket<E::Choice>) -> LabResult<Option<ChoiceRecord<E::Detail>>> {
        if ticket.generation != self.state.generation {
            warn!(
                experiment = self.exp.meta().slug,
                ticket = ticket.generation,
                current = self.state.generation,
                "dropping stale ticket"
            );
            return Ok(None);
        }
        self.act(ticket.choice)
    }

    fn apply(&mut self, event: Event<E::Choice>) -> LabResult<()> {
        let next = reduce(&self.exp, &self.state, event, &mut self.rng)?;
        let from = self.state.phase;
        let appended = next.history.len() > self.state.history.len();
        self.state = next;

        if appended {
            if let Some(rec) = self.state.history.last() {
                debug!(
                    experiment = self.exp.meta().slug,
                    trial = rec.trial_index,
                    value = rec.outcome_value,
                    score = self.state.cumulative_score,
                    "trial complete"
                );
                for h in self.hooks.iter_mut() {
                    h.on_record(rec);
                }
            }
        }
        let to = self.state.phase;
        if from != to {
            if to == Phase::Finished {
                info!(
                    experiment = self.exp.meta().slug,
                    score = self.state.cumulative_score,
                    "session finished"
                );
            }
            for h in self.hooks.iter_mut() {
                h.on_phase_change(from, to);
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Trial generator helpers
// -----------------------------------------------------------------------------

/// A trial with nothing to show but its position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Slot {
    /// 1-based.
    pub number: usize,
}

/// `n` bare slots numbered from 1.
pub fn slots(n: usize) -> Vec<Slot> {
    (1..=n).map(|number| Slot { number }).collect()
}

/// Shuffled copies of `combos` concatenated and truncated to `n`. Every
/// combination appears once before any repeats.
pub fn block_shuffled<T: Clone, R: RngCore + ?Sized>(rng: &mut R, combos: &[T], n: usize) -> Vec<T> {
    let mut out = Vec::with_capacity(n);
    if combos.is_empty() {
        return out;
    }
    while out.len() < n {
        let mut block = combos.to_vec();
        stoch::shuffle(rng, &mut block);
        let take = (n - out.len()).min(block.len());
        out.extend(block.into_iter().take(take));
    }
    out
}

/// `n` i.i.d. uniform draws from `catalog`.
pub fn sampled<T: Clone, R: RngCore + ?Sized>(rng: &mut R, catalog: &[T], n: usize) -> Vec<T> {
    if catalog.is_empty() {
        return Vec::new();
    }
    (0..n).map(|_| catalog[stoch::index(rng, catalog.len())].clone()).collect()
}

/// Coin-flip first value, then strict alternation.
pub fn alternating<T: Clone, R: RngCore + ?Sized>(rng: &mut R, a: T, b: T, n: usize) -> Vec<T> {
    let a_first = stoch::bernoulli(rng, 0.5);
    (0..n)
        .map(|i| if (i % 2 == 0) == a_first { a.clone() } else { b.clone() })
        .collect()
}
