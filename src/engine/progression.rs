use crate::models::RuleType;

/// The tunable parameters of a progression rule, decoupled from the
/// database row.
#[derive(Debug, Clone)]
pub struct RuleParams {
    pub rule_type: RuleType,
    pub increment_value: f64,
    pub consecutive_successes_required: i32,
    pub success_threshold: f64,
    pub maximum_value: Option<f64>,
    pub apply_deload: bool,
    pub deload_percentage: f64,
    pub consecutive_failures_for_deload: i32,
}

/// What a completed session looked like from the rule's point of view.
#[derive(Debug, Clone, Copy)]
pub struct SessionOutcome {
    /// Percentage of prescribed sets completed, 0-100.
    pub completion_rate: f64,
    /// Mean reported RPE across the exercise's sets, when feedback exists.
    pub average_rpe: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Increase { from: f64, to: f64 },
    Deload { from: f64, to: f64 },
    Hold,
}

/// Classifies a session outcome against the rule's threshold. RPE rules
/// succeed when the reported effort stays at or below the threshold;
/// everything else succeeds on completion rate.
pub fn is_success(params: &RuleParams, outcome: &SessionOutcome) -> bool {
    match params.rule_type {
        RuleType::Rpe => outcome
            .average_rpe
            .map(|rpe| rpe <= params.success_threshold)
            .unwrap_or(false),
        RuleType::Percentage | RuleType::Absolute => {
            outcome.completion_rate >= params.success_threshold
        }
    }
}

/// Decides what to do with the tracked value given the streaks so far
/// (both streaks already include the session being evaluated).
pub fn evaluate(
    params: &RuleParams,
    current_value: f64,
    success_streak: i32,
    failure_streak: i32,
) -> Decision {
    if success_streak >= params.consecutive_successes_required {
        let to = increased_value(params, current_value);
        // A clamped increase that changes nothing is a hold.
        if to > current_value {
            return Decision::Increase {
                from: current_value,
                to,
            };
        }
        return Decision::Hold;
    }

    if params.apply_deload && failure_streak >= params.consecutive_failures_for_deload {
        let to = deloaded_value(params, current_value);
        if to < current_value {
            return Decision::Deload {
                from: current_value,
                to,
            };
        }
        return Decision::Hold;
    }

    Decision::Hold
}

/// The incremented value for a single tracked number, capped at the rule's
/// maximum.
pub fn increased_value(params: &RuleParams, current: f64) -> f64 {
    let raw = match params.rule_type {
        RuleType::Percentage => current * (1.0 + params.increment_value / 100.0),
        RuleType::Absolute | RuleType::Rpe => current + params.increment_value,
    };
    let capped = match params.maximum_value {
        Some(max) => raw.min(max),
        None => raw,
    };
    round2(capped)
}

pub fn deloaded_value(params: &RuleParams, current: f64) -> f64 {
    round2(current * (1.0 - params.deload_percentage / 100.0))
}

/// Values are stored with two decimal places (kg / reps fractions are noise
/// beyond that).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(rule_type: RuleType) -> RuleParams {
        RuleParams {
            rule_type,
            increment_value: 2.5,
            consecutive_successes_required: 2,
            success_threshold: 90.0,
            maximum_value: None,
            apply_deload: true,
            deload_percentage: 10.0,
            consecutive_failures_for_deload: 3,
        }
    }

    #[test]
    fn completion_rate_gates_success() {
        let p = params(RuleType::Absolute);
        let good = SessionOutcome {
            completion_rate: 95.0,
            average_rpe: None,
        };
        let bad = SessionOutcome {
            completion_rate: 80.0,
            average_rpe: None,
        };
        assert!(is_success(&p, &good));
        assert!(!is_success(&p, &bad));
    }

    #[test]
    fn rpe_rule_gates_on_reported_effort() {
        let mut p = params(RuleType::Rpe);
        p.success_threshold = 7.0;
        let easy = SessionOutcome {
            completion_rate: 100.0,
            average_rpe: Some(6.5),
        };
        let hard = SessionOutcome {
            completion_rate: 100.0,
            average_rpe: Some(8.0),
        };
        let silent = SessionOutcome {
            completion_rate: 100.0,
            average_rpe: None,
        };
        assert!(is_success(&p, &easy));
        assert!(!is_success(&p, &hard));
        // No feedback means no evidence of success
        assert!(!is_success(&p, &silent));
    }

    #[test]
    fn absolute_increase_after_required_successes() {
        let p = params(RuleType::Absolute);
        assert_eq!(
            evaluate(&p, 100.0, 2, 0),
            Decision::Increase {
                from: 100.0,
                to: 102.5
            }
        );
    }

    #[test]
    fn no_increase_before_streak_complete() {
        let p = params(RuleType::Absolute);
        assert_eq!(evaluate(&p, 100.0, 1, 0), Decision::Hold);
    }

    #[test]
    fn percentage_increase_scales_current_value() {
        let mut p = params(RuleType::Percentage);
        p.increment_value = 5.0;
        assert_eq!(
            evaluate(&p, 80.0, 2, 0),
            Decision::Increase {
                from: 80.0,
                to: 84.0
            }
        );
    }

    #[test]
    fn increase_clamps_at_maximum() {
        let mut p = params(RuleType::Absolute);
        p.maximum_value = Some(101.0);
        assert_eq!(
            evaluate(&p, 100.0, 2, 0),
            Decision::Increase {
                from: 100.0,
                to: 101.0
            }
        );
    }

    #[test]
    fn at_maximum_becomes_hold() {
        let mut p = params(RuleType::Absolute);
        p.maximum_value = Some(100.0);
        assert_eq!(evaluate(&p, 100.0, 2, 0), Decision::Hold);
    }

    #[test]
    fn deload_after_consecutive_failures() {
        let p = params(RuleType::Absolute);
        assert_eq!(
            evaluate(&p, 100.0, 0, 3),
            Decision::Deload {
                from: 100.0,
                to: 90.0
            }
        );
    }

    #[test]
    fn deload_disabled_holds() {
        let mut p = params(RuleType::Absolute);
        p.apply_deload = false;
        assert_eq!(evaluate(&p, 100.0, 0, 5), Decision::Hold);
    }

    #[test]
    fn failures_below_threshold_hold() {
        let p = params(RuleType::Absolute);
        assert_eq!(evaluate(&p, 100.0, 0, 2), Decision::Hold);
    }

    #[test]
    fn deload_of_zero_value_holds() {
        let p = params(RuleType::Absolute);
        assert_eq!(evaluate(&p, 0.0, 0, 3), Decision::Hold);
    }

    #[test]
    fn values_round_to_two_decimals() {
        let mut p = params(RuleType::Percentage);
        p.increment_value = 2.5;
        assert_eq!(
            evaluate(&p, 102.5, 2, 0),
            Decision::Increase {
                from: 102.5,
                to: 105.06
            }
        );
    }
}
