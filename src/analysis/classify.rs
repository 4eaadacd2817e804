//! Per-reading failure classification.
//!
//! Each reading is tested against every rule in the tolerance model, in
//! canonical order. A parameter missing from the reading is reported as
//! `NotMeasured` and takes no part in pass/fail counting or excursion sums.

use crate::logging::{self, Component};
use crate::model::{Reading, WqiError};
use crate::tolerances::{ToleranceModel, ToleranceRule};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of testing one parameter of one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TestOutcome {
    NotMeasured,
    Pass,
    /// `excursion` is the normalized distance past the violated bound.
    Fail { excursion: f64 },
}

impl TestOutcome {
    pub fn is_tested(&self) -> bool {
        !matches!(self, TestOutcome::NotMeasured)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, TestOutcome::Fail { .. })
    }

    pub fn excursion(&self) -> f64 {
        match self {
            TestOutcome::Fail { excursion } => *excursion,
            _ => 0.0,
        }
    }
}

/// Outcomes for one reading, aligned with the model's canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct RowClassification {
    pub outcomes: Vec<TestOutcome>,
}

impl RowClassification {
    /// Row failure vector. Unmeasured positions are `false` but are not
    /// passes; use `tested()` to tell them apart.
    pub fn failures(&self) -> Vec<bool> {
        self.outcomes.iter().map(TestOutcome::is_failure).collect()
    }

    /// Row excursion vector; zero for passes and unmeasured parameters.
    pub fn excursions(&self) -> Vec<f64> {
        self.outcomes.iter().map(TestOutcome::excursion).collect()
    }

    pub fn tested(&self) -> Vec<bool> {
        self.outcomes.iter().map(TestOutcome::is_tested).collect()
    }

    pub fn test_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_tested()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Tests a single measured value against a rule.
///
/// Upper bound: fails when `value > bound`, excursion `value / bound - 1`.
/// Range: below `low` gives `low / value - 1`, above `high` gives
/// `value / high - 1`. A non-finite value, a non-positive value under a
/// range floor, or a value whose excursion overflows is a value error.
pub fn evaluate(parameter: &str, rule: ToleranceRule, value: f64) -> Result<TestOutcome, WqiError> {
    if !value.is_finite() {
        return Err(invalid(parameter, value));
    }
    let outcome = match rule {
        ToleranceRule::UpperBound(bound) => {
            if value > bound {
                TestOutcome::Fail {
                    excursion: value / bound - 1.0,
                }
            } else {
                TestOutcome::Pass
            }
        }
        ToleranceRule::Range { low, high } => {
            if value < low {
                if value <= 0.0 {
                    return Err(invalid(parameter, value));
                }
                TestOutcome::Fail {
                    excursion: low / value - 1.0,
                }
            } else if value > high {
                TestOutcome::Fail {
                    excursion: value / high - 1.0,
                }
            } else {
                TestOutcome::Pass
            }
        }
    };
    if !outcome.excursion().is_finite() {
        return Err(invalid(parameter, value));
    }
    Ok(outcome)
}

/// Classifies every parameter of `reading` against `model`.
///
/// Fails with `UnknownParameter` if the reading names a parameter the model
/// has no rule for.
pub fn classify(reading: &Reading, model: &ToleranceModel) -> Result<RowClassification, WqiError> {
    let outcomes = classify_values(reading, model).inspect_err(|e| {
        logging::debug(
            Component::Classifier,
            None,
            &format!("reading at {} rejected: {}", reading.timestamp, e),
        )
    })?;
    Ok(RowClassification { outcomes })
}

fn classify_values(reading: &Reading, model: &ToleranceModel) -> Result<Vec<TestOutcome>, WqiError> {
    if let Some(unknown) = reading.values.keys().find(|name| !model.contains(name)) {
        return Err(WqiError::UnknownParameter(unknown.clone()));
    }

    model
        .parameters()
        .iter()
        .map(|p| match reading.value(&p.name) {
            Some(value) => evaluate(&p.name, p.rule, value),
            None => Ok(TestOutcome::NotMeasured),
        })
        .collect()
}

fn invalid(parameter: &str, value: f64) -> WqiError {
    WqiError::InvalidValue {
        parameter: parameter.to_string(),
        raw: value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
