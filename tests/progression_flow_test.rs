// Progression rules evaluated over a run of sessions, streak bookkeeping
// included, the way the evaluation service drives the engine.

mod common;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use uuid::Uuid;
use workout_tracker::engine::progression::{evaluate, is_success, Decision, SessionOutcome};
use workout_tracker::models::{RuleType, ProgressionRule};

use common::MockData;

fn completed(rate: f64) -> SessionOutcome {
    SessionOutcome {
        completion_rate: rate,
        average_rpe: None,
    }
}

/// Runs a sequence of outcomes through a rule the way the service does:
/// streaks accumulate per session and reset whenever an action applies.
fn run_sessions(
    rule: &ProgressionRule,
    start_value: f64,
    outcomes: &[SessionOutcome],
) -> (f64, Vec<Decision>) {
    let params = rule.params();
    let mut value = start_value;
    let mut successes = 0;
    let mut failures = 0;
    let mut decisions = Vec::new();

    for outcome in outcomes {
        if is_success(&params, outcome) {
            successes += 1;
            failures = 0;
        } else {
            successes = 0;
            failures += 1;
        }

        let decision = evaluate(&params, value, successes, failures);
        match decision {
            Decision::Increase { to, .. } | Decision::Deload { to, .. } => {
                value = to;
                successes = 0;
                failures = 0;
            }
            Decision::Hold => {}
        }
        decisions.push(decision);
    }

    (value, decisions)
}

#[test]
fn two_good_sessions_earn_an_increase() {
    let rule = MockData::rule(Uuid::new_v4());
    let (value, decisions) = run_sessions(&rule, 100.0, &[completed(95.0), completed(100.0)]);

    assert_eq!(value, 102.5);
    assert_eq!(decisions[0], Decision::Hold);
    assert_matches!(decisions[1], Decision::Increase { from, to } if from == 100.0 && to == 102.5);
}

#[test]
fn a_failure_breaks_the_streak() {
    let rule = MockData::rule(Uuid::new_v4());
    let (value, decisions) = run_sessions(
        &rule,
        100.0,
        &[completed(95.0), completed(50.0), completed(95.0)],
    );

    // One success, a miss, one success: never two in a row.
    assert_eq!(value, 100.0);
    assert!(decisions.iter().all(|d| *d == Decision::Hold));
}

#[test]
fn three_failures_trigger_a_deload() {
    let rule = MockData::rule(Uuid::new_v4());
    let (value, decisions) = run_sessions(
        &rule,
        100.0,
        &[completed(40.0), completed(50.0), completed(60.0)],
    );

    assert_eq!(value, 90.0);
    assert_matches!(decisions[2], Decision::Deload { from, to } if from == 100.0 && to == 90.0);
}

#[test]
fn progression_resumes_after_a_deload() {
    let rule = MockData::rule(Uuid::new_v4());
    let (value, decisions) = run_sessions(
        &rule,
        100.0,
        &[
            completed(40.0),
            completed(50.0),
            completed(60.0), // deload to 90
            completed(95.0),
            completed(95.0), // increase to 92.5
        ],
    );

    assert_eq!(value, 92.5);
    assert_matches!(decisions[4], Decision::Increase { from, to } if from == 90.0 && to == 92.5);
}

#[test]
fn value_pins_at_the_configured_maximum() {
    let mut rule = MockData::rule(Uuid::new_v4());
    rule.maximum_value = Some(101.0);

    let (value, decisions) = run_sessions(
        &rule,
        100.0,
        &[
            completed(95.0),
            completed(95.0), // clamped increase to 101
            completed(95.0),
            completed(95.0), // already at max, held
        ],
    );

    assert_eq!(value, 101.0);
    assert_matches!(decisions[1], Decision::Increase { to, .. } if to == 101.0);
    assert_eq!(decisions[3], Decision::Hold);
}

#[test]
fn percentage_rules_compound_on_the_new_value() {
    let mut rule = MockData::rule(Uuid::new_v4());
    rule.rule_type = RuleType::Percentage;
    rule.increment_value = 10.0;

    let (value, _) = run_sessions(
        &rule,
        100.0,
        &[
            completed(95.0),
            completed(95.0), // 110
            completed(95.0),
            completed(95.0), // 121
        ],
    );

    assert_eq!(value, 121.0);
}

#[test]
fn rpe_rules_need_reported_effort() {
    let mut rule = MockData::rule(Uuid::new_v4());
    rule.rule_type = RuleType::Rpe;
    rule.success_threshold = 8.0;
    let params = rule.params();

    let easy = SessionOutcome {
        completion_rate: 100.0,
        average_rpe: Some(7.0),
    };
    let no_feedback = SessionOutcome {
        completion_rate: 100.0,
        average_rpe: None,
    };

    assert!(is_success(&params, &easy));
    assert!(!is_success(&params, &no_feedback));
}
