// tests/lab.rs
use std::cell::RefCell;
use std::rc::Rc;

use decision_lab::clock::{ManualClock, iso_millis};
use decision_lab::config::LabConfig;
use decision_lab::export::{export_document, export_session};
use decision_lab::suites::{self, Catalog, ExperimentKind, Route};
use decision_lab::systems::balloon_risk::{self, Action as Pump, BalloonRisk};
use decision_lab::systems::dictator::{self, Dictator};
use decision_lab::systems::framing_effect::{Frame, FramingEffect};
use decision_lab::systems::iowa_gambling::IowaGambling;
use decision_lab::systems::matrix_games::{MatrixGame, Move};
use decision_lab::systems::policy::{ArmStats, BanditStrategy, ThresholdAcceptance};
use decision_lab::systems::sdk::{self, ChoiceRecord, Experiment, Hook, Session, SessionState};
use decision_lab::systems::ultimatum::{self, Action as Deal, Role, Ultimatum};
use decision_lab::{LabError, Phase, seeded_rng};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn dictator(rounds: usize) -> Dictator {
    Dictator::new(dictator::Config { rounds, ..dictator::Config::default() })
}

/* ──────────────────────────────────────────────────────────────────────────
1) Session loop: phases, history, score
────────────────────────────────────────────────────────────────────────── */

#[test]
fn history_tracks_current_trial_until_finished() {
    init_tracing();
    let clock = ManualClock::new(0);
    let mut s = Session::new(dictator(5), 1, &clock);
    assert_eq!(s.phase(), Phase::Instruction);
    assert!(s.current_trial().is_none());

    s.start().unwrap();
    for i in 0..5 {
        assert_eq!(s.phase(), Phase::Playing);
        assert_eq!(s.history().len(), s.state().current_trial);
        assert_eq!(s.current_trial().map(|t| t.number), Some(i + 1));
        clock.advance(250);
        s.act(10.0 * i as f64).unwrap();
    }
    assert_eq!(s.phase(), Phase::Finished);
    assert_eq!(s.history().len(), 5);
    assert!(s.current_trial().is_none());

    let kept: f64 = s.history().iter().map(|r| r.outcome_value).sum();
    assert_eq!(s.state().cumulative_score, kept);
    assert_eq!(kept, 100.0 + 90.0 + 80.0 + 70.0 + 60.0);
}

#[test]
fn dictator_keeps_the_remainder() {
    let clock = ManualClock::new(0);
    let mut s = Session::new(Dictator::default(), 3, &clock);
    s.start().unwrap();
    let rec = s.act(30.0).unwrap().expect("dictator rounds complete in one action");
    assert_eq!(rec.outcome_value, 70.0);
    assert_eq!(rec.detail.allocation, 30.0);
    assert_eq!(s.state().current_trial, 1);
    assert_eq!(s.state().cumulative_score, 70.0);

    let err = s.act(101.0).unwrap_err();
    assert!(matches!(err, LabError::OutOfRange { field: "allocation", .. }));
    assert_eq!(s.state().current_trial, 1, "rejected input leaves the state untouched");
}

#[test]
fn events_in_the_wrong_phase_are_rejected() {
    let clock = ManualClock::new(0);
    let mut s = Session::new(dictator(1), 0, &clock);

    assert!(matches!(s.act(0.0), Err(LabError::Phase { action: "act", phase: Phase::Instruction })));
    s.start().unwrap();
    assert!(matches!(s.start(), Err(LabError::Phase { action: "start", phase: Phase::Playing })));
    s.act(0.0).unwrap();
    assert_eq!(s.phase(), Phase::Finished);
    assert!(matches!(s.act(0.0), Err(LabError::Phase { action: "act", phase: Phase::Finished })));
    assert!(s.submit(0.0).is_err());
}

#[test]
fn zero_trials_finish_on_start() {
    let clock = ManualClock::new(42);
    let mut s = Session::new(dictator(0), 0, &clock);
    s.start().unwrap();
    assert_eq!(s.phase(), Phase::Finished);
    assert_eq!(s.state().ended_ms, Some(42));
}

#[test]
fn hooks_see_records_and_phase_changes() {
    #[derive(Default)]
    struct Log {
        records: usize,
        phases: Vec<(Phase, Phase)>,
    }
    struct Recorder(Rc<RefCell<Log>>);
    impl<D> Hook<D> for Recorder {
        fn on_record(&mut self, _record: &ChoiceRecord<D>) {
            self.0.borrow_mut().records += 1;
        }
        fn on_phase_change(&mut self, from: Phase, to: Phase) {
            self.0.borrow_mut().phases.push((from, to));
        }
    }

    let log = Rc::new(RefCell::new(Log::default()));
    let clock = ManualClock::new(0);
    let mut s = Session::new(dictator(2), 0, &clock);
    s.add_hook(Box::new(Recorder(Rc::clone(&log))));
    s.start().unwrap();
    s.act(50.0).unwrap();
    s.act(50.0).unwrap();
    s.reset().unwrap();

    let log = log.borrow();
    assert_eq!(log.records, 2);
    assert_eq!(
        log.phases,
        vec![
            (Phase::Instruction, Phase::Playing),
            (Phase::Playing, Phase::Finished),
            (Phase::Finished, Phase::Instruction),
        ]
    );
}

/* ──────────────────────────────────────────────────────────────────────────
2) Reset and deferred actions
────────────────────────────────────────────────────────────────────────── */

#[test]
fn reset_discards_pending_tickets() {
    init_tracing();
    let clock = ManualClock::new(0);
    let mut s = Session::new(MatrixGame::prisoners_dilemma(), 5, &clock);
    s.start().unwrap();

    let ticket = s.submit(Move::Primary).unwrap();
    assert_eq!(ticket.due_ms, 1000);
    clock.advance(999);
    assert!(!s.is_due(&ticket));
    clock.advance(1);
    assert!(s.is_due(&ticket));

    s.reset().unwrap();
    assert_eq!(s.phase(), Phase::Instruction);
    assert_eq!(s.state().generation, 1);
    assert!(s.resolve(ticket).unwrap().is_none());
    assert!(s.history().is_empty());
    assert_eq!(s.state().cumulative_score, 0.0);
}

fn trial_keys(state: &SessionState<FramingEffect>) -> Vec<(u32, Frame)> {
    state.trials.iter().map(|t| (t.scenario_id, t.frame)).collect()
}

fn sorted<T: Ord>(mut v: Vec<T>) -> Vec<T> {
    v.sort_unstable();
    v
}

#[test]
fn reset_reshuffles_the_same_trials() {
    let clock = ManualClock::new(0);
    let mut s = Session::new(FramingEffect::default(), 8, &clock);
    let first = trial_keys(s.state());
    assert_eq!(first.len(), 10);
    let mut reordered = false;
    for _ in 0..5 {
        s.reset().unwrap();
        let again = trial_keys(s.state());
        assert_eq!(sorted(again.clone()), sorted(first.clone()));
        reordered |= again != first;
    }
    assert!(reordered, "five resets never changed the trial order");
}

#[test]
fn live_ticket_resolves_into_a_record() {
    let clock = ManualClock::new(0);
    let mut s = Session::new(MatrixGame::prisoners_dilemma(), 5, &clock);
    s.start().unwrap();
    let ticket = s.submit(Move::Primary).unwrap();
    clock.set(ticket.due_ms);
    let rec = s.resolve(ticket).unwrap().expect("one round per action");
    assert_eq!(rec.timestamp_ms, 1000);
    assert_eq!(s.state().current_trial, 1);
}

/* ──────────────────────────────────────────────────────────────────────────
3) Export document
────────────────────────────────────────────────────────────────────────── */

#[test]
fn export_lists_every_record_with_reaction_times() {
    let clock = ManualClock::new(1_000);
    let mut s = Session::new(dictator(3), 9, &clock);
    s.start().unwrap();
    for (gap, given) in [(500, 10.0), (1200, 50.0), (300, 0.0)] {
        clock.advance(gap);
        s.act(given).unwrap();
    }

    let (name, doc) = export_session(&s).unwrap();
    assert_eq!(name, "dictator-game-results-3000.json");

    let info = &doc["experimentInfo"];
    assert_eq!(info["name"], "Dictator Game");
    assert_eq!(info["startTime"], iso_millis(1_000));
    assert_eq!(info["startTime"], "1970-01-01T00:00:01.000Z");
    assert_eq!(info["totalTime"], 2_000);
    assert_eq!(info["totalRounds"], 3);
    assert_eq!(info["totalPoints"], 240.0);
    assert_eq!(info["averageAllocation"], 20.0);

    let rows = doc["rounds"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    let reaction: Vec<i64> = rows.iter().map(|r| r["reactionTime"].as_i64().unwrap()).collect();
    assert_eq!(reaction, vec![0, 1200, 300]);
    assert_eq!(rows[1]["round"], 2);
    assert_eq!(rows[1]["allocation"], 50.0);
}

#[test]
fn partial_runs_export_what_they_have() {
    let clock = ManualClock::new(0);
    let mut s = Session::new(dictator(4), 9, &clock);
    s.start().unwrap();
    s.act(25.0).unwrap();
    let doc = export_document(s.experiment(), s.state(), 5_000).unwrap();
    assert_eq!(doc["rounds"].as_array().unwrap().len(), 1);
    assert_eq!(doc["experimentInfo"]["endTime"], iso_millis(5_000));
}

/* ──────────────────────────────────────────────────────────────────────────
4) Generators and counterparts
────────────────────────────────────────────────────────────────────────── */

#[test]
fn block_shuffle_keeps_the_multiset() {
    let mut rng = seeded_rng(77);
    let mut trials = sdk::block_shuffled(&mut rng, &['a', 'b', 'c'], 6);
    trials.sort_unstable();
    assert_eq!(trials, vec!['a', 'a', 'b', 'b', 'c', 'c']);
}

#[test]
fn prisoners_dilemma_scores_against_a_cooperative_opener() {
    let clock = ManualClock::new(0);
    // Tit-for-tat always opens with cooperation.
    for (mv, expected) in [(Move::Primary, 30.0), (Move::Alternative, 50.0)] {
        let mut s = Session::new(MatrixGame::prisoners_dilemma(), 11, &clock);
        s.start().unwrap();
        let rec = s.act(mv).unwrap().unwrap();
        assert_eq!(rec.detail.ai_choice, "cooperate");
        assert_eq!(rec.outcome_value, expected);
    }
}

#[test]
fn ucb_tries_every_arm_then_exploits() {
    let mut rng = seeded_rng(0);
    let mut arms = vec![ArmStats::default(); 3];
    arms[0].record(50.0);
    assert_eq!(BanditStrategy::Ucb.choose(&arms, 1, &mut rng), 1);

    let arms = [
        ArmStats { times_chosen: 10, total_reward: 800.0 },
        ArmStats { times_chosen: 10, total_reward: 200.0 },
        ArmStats { times_chosen: 10, total_reward: 300.0 },
    ];
    assert_eq!(BanditStrategy::Ucb.choose(&arms, 30, &mut rng), 0);
}

#[test]
fn responder_threshold_rises_linearly() {
    let p = ThresholdAcceptance::default();
    assert_eq!(p.probability(25.0, 100.0), 0.0);
    assert_eq!(p.probability(62.5, 100.0), 0.5);
    assert_eq!(p.probability(100.0, 100.0), 1.0);
}

#[test]
fn mid_offers_are_accepted_about_half_the_time() {
    let mut rng = seeded_rng(62);
    let responder = ThresholdAcceptance::default();
    let n = 20_000;
    let accepted = (0..n).filter(|_| responder.decide(62.5, 100.0, &mut rng)).count();
    let rate = accepted as f64 / n as f64;
    assert!((rate - 0.5).abs() < 0.02, "acceptance rate {rate}");
}

#[test]
fn repeated_dilemma_play_recovers_every_payoff() {
    let clock = ManualClock::new(0);
    let mut game = MatrixGame::prisoners_dilemma();
    game.cfg.rounds = 400;
    let mut s = Session::new(game, 17, &clock);
    // cooperate, defect, defect, cooperate: reaches all four cells against tit-for-tat
    let run = suites::run_scripted(&mut s, 1_000, |state| match state.current_trial % 4 {
        0 | 3 => Move::Primary,
        _ => Move::Alternative,
    })
    .unwrap();
    assert!(run.finished);

    let mut seen = std::collections::BTreeMap::new();
    for rec in s.history() {
        let cell = (rec.detail.player_primary, rec.detail.ai_primary);
        let reward = *seen.entry(cell).or_insert(rec.outcome_value);
        assert_eq!(reward, rec.outcome_value, "payoff for {cell:?} varied");
    }
    let expected = [((true, true), 30.0), ((false, false), -10.0), ((false, true), 50.0), ((true, false), -30.0)];
    assert_eq!(seen.len(), 4);
    for (cell, payoff) in expected {
        assert_eq!(seen[&cell], payoff, "cell {cell:?}");
    }
}

#[test]
fn lowball_offers_are_always_rejected() {
    let clock = ManualClock::new(0);
    let mut s = Session::new(Ultimatum::new(ultimatum::Config { rounds: 10, ..Default::default() }), 4, &clock);
    let run = suites::run_scripted(&mut s, 100, |state| match state.current().map(|t| t.role) {
        Some(Role::Proposer) => Deal::Offer(20.0),
        _ => Deal::Respond(false),
    })
    .unwrap();
    assert!(run.finished);
    assert_eq!(run.steps, 10);
    assert_eq!(run.score, 0.0);
    assert_eq!(run.summary.acceptance_rate, 0.0);
    assert_eq!(run.summary.average_offer, 20.0);
}

#[test]
fn balloon_pumps_before_a_pop_average_half_the_tier() {
    init_tracing();
    let clock = ManualClock::new(0);
    let cfg = balloon_risk::Config { trials: 30, max_pumps: vec![16], ..Default::default() };
    let runs = suites::run_seeds(
        0..20,
        |seed| Session::new(BalloonRisk::new(cfg.clone()), seed, &clock),
        10_000,
        |_| Pump::Pump,
    )
    .unwrap();

    assert!(runs.iter().all(|r| r.finished && r.score == 0.0));
    let mean = runs.iter().map(|r| r.summary.average_pumps).sum::<f64>() / runs.len() as f64;
    assert!((mean - 7.5).abs() < 1.0, "mean pumps {mean}");
    assert!(runs.iter().all(|r| r.summary.pop_rate == 1.0));
}

#[test]
fn scripted_run_stops_at_the_step_budget() {
    let clock = ManualClock::new(0);
    let mut s = Session::new(IowaGambling::default(), 2, &clock);
    let run = suites::run_scripted(&mut s, 10, |_| 2).unwrap();
    assert!(!run.finished);
    assert_eq!(run.steps, 10);
    assert_eq!(s.phase(), Phase::Playing);
    assert!(suites::run_scripted(&mut s, 1, |_| 9).is_err());
}

/* ──────────────────────────────────────────────────────────────────────────
5) Catalog, routes, config
────────────────────────────────────────────────────────────────────────── */

const CATALOG: &str = r#"{
  "experiments": [
    { "id": 1, "title": "Prospect Theory", "authors": "Kahneman, D.; Tversky, A.",
      "description": "Framing of gains and losses", "category": "decision-making",
      "isPopular": true, "experimentPath": "/experiments/framing-effect-tasks" },
    { "id": 2, "title": "Iowa Gambling Task", "authors": "Bechara, A.",
      "description": "Learning under uncertainty", "category": "decision-making",
      "experimentPath": "/experiments/iowa-gambling-task" },
    { "id": 3, "title": "Trust Game", "authors": "Berg, J.",
      "description": "Reciprocity between strangers", "category": "game-theory" }
  ]
}"#;

#[test]
fn catalog_find_and_search() {
    let catalog = Catalog::from_json_str(CATALOG).unwrap();
    assert_eq!(catalog.find(2).unwrap().kind(), Some(ExperimentKind::IowaGambling));
    assert!(catalog.find(3).unwrap().kind().is_none());
    assert!(matches!(catalog.find(99), Err(LabError::NotFound(99))));

    let ids = |hits: Vec<&decision_lab::suites::CatalogEntry>| hits.iter().map(|e| e.id).collect::<Vec<_>>();
    assert_eq!(ids(catalog.search("KAHNEMAN", "all")), vec![1]);
    assert_eq!(ids(catalog.search("", "decision-making")), vec![1, 2]);
    assert_eq!(ids(catalog.search("", "all")), vec![1, 2, 3]);
    assert!(catalog.search("trust", "decision-making").is_empty());
}

#[test]
fn paths_resolve_to_routes() {
    let catalog = Catalog::from_json_str(CATALOG).unwrap();
    assert_eq!(catalog.resolve("/experiments/1").unwrap(), Route::Detail(1));
    assert_eq!(catalog.resolve("/experiments/trust-game").unwrap(), Route::Run(ExperimentKind::Trust));
    assert!(matches!(catalog.resolve("/experiments/7"), Err(LabError::NotFound(7))));
    assert!(matches!(catalog.resolve("/nowhere"), Err(LabError::UnknownExperiment(_))));
    assert_eq!(ExperimentKind::enabled().count(), ExperimentKind::ALL.len());
}

#[test]
fn catalog_names_match_export_names() {
    assert_eq!(ExperimentKind::BalloonRisk.name(), BalloonRisk::default().meta().name);
    assert_eq!(ExperimentKind::IowaGambling.name(), IowaGambling::default().meta().name);
    assert_eq!(ExperimentKind::Dictator.name(), Dictator::default().meta().name);
    assert_eq!(ExperimentKind::PrisonersDilemma.name(), MatrixGame::prisoners_dilemma().meta().name);
}

#[test]
fn config_overrides_reach_the_experiment() {
    let cfg = LabConfig::from_json_str(
        r#"{ "seed": 12, "experiments": { "dictator-game": { "rounds": 2, "totalAmount": 10 } } }"#,
    )
    .unwrap();
    assert_eq!(cfg.seed_or_entropy(), 12);

    let clock = ManualClock::new(0);
    let mut s = Session::new(Dictator::new(cfg.experiments.dictator.clone()), cfg.seed_or_entropy(), &clock);
    s.start().unwrap();
    assert_eq!(s.act(4.0).unwrap().unwrap().outcome_value, 6.0);
    assert!(s.act(11.0).is_err());
}

#[test]
fn config_rejects_impossible_bandit_setups() {
    let bad_arms = r#"{ "experiments": { "enhanced-bandit-task": { "numBandits": 9 } } }"#;
    assert!(matches!(LabConfig::from_json_str(bad_arms), Err(LabError::Config(_))));

    let bad_study = r#"{ "experiments": { "reward-social-comparison-bandit-task": { "studyId": 7 } } }"#;
    assert!(matches!(LabConfig::from_json_str(bad_study), Err(LabError::Config(_))));

    assert!(matches!(LabConfig::from_json_str("{ nope"), Err(LabError::Json(_))));
    assert!(matches!(LabConfig::from_path("/no/such/lab.json"), Err(LabError::Io(_))));
}
