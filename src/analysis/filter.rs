//! Sampling filter for scored periods.
//!
//! A period is kept only when it has strictly more tests than `min_tests`
//! and strictly more distinct tested parameters than `min_parameters`.

use std::fmt;

use crate::analysis::aggregate::ClosedPeriod;

/// Minimum sampling a period needs to be reported. Defaults to 120 tests
/// (about four tests a day over a month) and 2 parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodFilter {
    pub min_tests: u32,
    pub min_parameters: usize,
}

impl Default for PeriodFilter {
    fn default() -> Self {
        PeriodFilter {
            min_tests: 120,
            min_parameters: 2,
        }
    }
}

/// Why a closed period produced no result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Nothing was measured in the period.
    NoTests,
    /// A sub-index was undefined.
    NoScore,
    TooFewTests { tests: u32, minimum: u32 },
    TooFewParameters { parameters: usize, minimum: usize },
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::NoTests => write!(f, "no tests in period"),
            DropReason::NoScore => write!(f, "sub-index undefined"),
            DropReason::TooFewTests { tests, minimum } => {
                write!(f, "{} tests (needs more than {})", tests, minimum)
            }
            DropReason::TooFewParameters { parameters, minimum } => {
                write!(f, "{} parameters tested (needs more than {})", parameters, minimum)
            }
        }
    }
}

impl PeriodFilter {
    /// `Ok` if the period is sampled well enough, else the reason to drop it.
    pub fn check(&self, period: &ClosedPeriod) -> Result<(), DropReason> {
        let tests = period.total_tests();
        if tests <= self.min_tests {
            return Err(DropReason::TooFewTests {
                tests,
                minimum: self.min_tests,
            });
        }
        let parameters = period.parameters_tested();
        if parameters <= self.min_parameters {
            return Err(DropReason::TooFewParameters {
                parameters,
                minimum: self.min_parameters,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodGranularity;
    use chrono::NaiveDate;

    fn period(tests: Vec<u32>) -> ClosedPeriod {
        let ts = NaiveDate::from_ymd_opt(2023, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let width = tests.len();
        ClosedPeriod {
            key: PeriodGranularity::Month.key_for(&ts),
            tests,
            failures: vec![0; width],
            excursion_sums: vec![0.0; width],
            readings: 0,
        }
    }

    #[test]
    fn test_exactly_minimum_tests_is_dropped() {
        let filter = PeriodFilter::default();
        let result = filter.check(&period(vec![40, 40, 40]));
        assert_eq!(
            result,
            Err(DropReason::TooFewTests { tests: 120, minimum: 120 }),
            "120 tests must be excluded: the threshold is strictly greater than"
        );
    }

    #[test]
    fn test_one_above_minimum_tests_is_kept() {
        assert!(PeriodFilter::default().check(&period(vec![41, 40, 40])).is_ok());
    }

    #[test]
    fn test_two_parameters_is_dropped_by_default() {
        let result = PeriodFilter::default().check(&period(vec![100, 100, 0]));
        assert_eq!(
            result,
            Err(DropReason::TooFewParameters { parameters: 2, minimum: 2 })
        );
    }

    #[test]
    fn test_zero_thresholds_keep_any_tested_period() {
        let filter = PeriodFilter { min_tests: 0, min_parameters: 0 };
        assert!(filter.check(&period(vec![1])).is_ok());
    }
}
