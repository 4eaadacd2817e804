//! CCME sub-indices and per-parameter diagnostics.
//!
//! - F1 (scope): share of tested parameters that failed at least once.
//! - F2 (frequency): share of individual tests that failed.
//! - F3 (amplitude): normalized sum of excursions, compressed to 0..100.
//!
//! Each is `None` when its denominator is zero, which the composer treats as
//! "no score possible".

use crate::analysis::aggregate::ClosedPeriod;
use crate::model::{Contributor, Grade, ParameterGrade};
use crate::tolerances::ToleranceModel;

/// The three CCME factors for one period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubIndices {
    pub f1: Option<f64>,
    pub f2: Option<f64>,
    pub f3: Option<f64>,
}

impl SubIndices {
    pub fn compute(period: &ClosedPeriod) -> Self {
        SubIndices {
            f1: f1(period),
            f2: f2(period),
            f3: f3(period),
        }
    }
}

// ---------------------------------------------------------------------------
// Factors
// ---------------------------------------------------------------------------

pub fn f1(period: &ClosedPeriod) -> Option<f64> {
    let tested = period.parameters_tested();
    if tested == 0 {
        return None;
    }
    Some(100.0 * period.parameters_failed() as f64 / tested as f64)
}

pub fn f2(period: &ClosedPeriod) -> Option<f64> {
    let tests = period.total_tests();
    if tests == 0 {
        return None;
    }
    Some(100.0 * period.total_failures() as f64 / tests as f64)
}

/// Normalized sum of excursions: total excursion per test.
pub fn nse(period: &ClosedPeriod) -> Option<f64> {
    let tests = period.total_tests();
    if tests == 0 {
        return None;
    }
    Some(period.total_excursion() / tests as f64)
}

/// `F3 = nse / (0.01 * nse + 0.01)`; approaches but never reaches 100.
/// Undefined when the excursion sum has overflowed.
pub fn f3(period: &ClosedPeriod) -> Option<f64> {
    nse(period)
        .filter(|nse| nse.is_finite())
        .map(|nse| nse / (0.01 * nse + 0.01))
}

// ---------------------------------------------------------------------------
// Per-parameter diagnostics
// ---------------------------------------------------------------------------

/// Grade score per parameter: average excursion plus failure ratio.
/// `None` for parameters without tests in the period.
pub fn grade_scores(period: &ClosedPeriod) -> Vec<Option<f64>> {
    (0..period.tests.len())
        .map(|i| Some(period.average_excursion(i)? + period.failure_ratio(i)?))
        .collect()
}

/// Letter grades in canonical order; untested parameters are `NotAssessed`.
pub fn grades(period: &ClosedPeriod, model: &ToleranceModel) -> Vec<ParameterGrade> {
    model
        .parameters()
        .iter()
        .zip(grade_scores(period))
        .map(|(p, score)| ParameterGrade {
            parameter: p.name.clone(),
            grade: score.map_or(Grade::NotAssessed, Grade::from_score),
        })
        .collect()
}

/// The tested parameter with the highest grade score. Ties go to the first
/// parameter in canonical order; a period with no positive score reports
/// `AllWithinRange`.
pub fn worst_contributor(period: &ClosedPeriod, model: &ToleranceModel) -> Contributor {
    let mut worst: Option<(&str, f64)> = None;
    for (p, score) in model.parameters().iter().zip(grade_scores(period)) {
        let Some(score) = score else { continue };
        if worst.is_none_or(|(_, best)| score > best) {
            worst = Some((&p.name, score));
        }
    }

    match worst {
        Some((name, score)) if score > 0.0 => Contributor::Parameter(name.to_string()),
        _ => Contributor::AllWithinRange,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
