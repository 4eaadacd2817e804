//! Period-scoped running aggregation.
//!
//! Readings arrive in timestamp order. The aggregator keeps exactly one open
//! `PeriodAccumulator`; it is created by the first reading of a period key,
//! folds every following reading with the same key, and is closed the moment
//! a reading with a different key arrives or the stream ends. Closed periods
//! are frozen into `ClosedPeriod` and never reopened.

use crate::analysis::classify::RowClassification;
use crate::period::PeriodKey;

// ---------------------------------------------------------------------------
// Open accumulator
// ---------------------------------------------------------------------------

/// Running totals for the period currently being read.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodAccumulator {
    key: PeriodKey,
    tests: Vec<u32>,
    failures: Vec<u32>,
    excursion_sums: Vec<f64>,
    readings: usize,
}

impl PeriodAccumulator {
    /// Starts an empty accumulator for `width` parameters.
    pub fn new(key: PeriodKey, width: usize) -> Self {
        PeriodAccumulator {
            key,
            tests: vec![0; width],
            failures: vec![0; width],
            excursion_sums: vec![0.0; width],
            readings: 0,
        }
    }

    pub fn key(&self) -> &PeriodKey {
        &self.key
    }

    /// Adds one classified reading. Unmeasured positions contribute nothing;
    /// positions beyond the accumulator's width are ignored.
    pub fn fold(&mut self, row: &RowClassification) {
        let slots = self
            .tests
            .iter_mut()
            .zip(self.failures.iter_mut())
            .zip(self.excursion_sums.iter_mut());
        for (outcome, ((tests, failures), excursion)) in row.outcomes.iter().zip(slots) {
            if outcome.is_tested() {
                *tests += 1;
            }
            if outcome.is_failure() {
                *failures += 1;
                *excursion += outcome.excursion();
            }
        }
        self.readings += 1;
    }

    /// Freezes the totals.
    pub fn close(self) -> ClosedPeriod {
        ClosedPeriod {
            key: self.key,
            tests: self.tests,
            failures: self.failures,
            excursion_sums: self.excursion_sums,
            readings: self.readings,
        }
    }
}

// ---------------------------------------------------------------------------
// Closed period
// ---------------------------------------------------------------------------

/// Frozen totals for one period, in canonical parameter order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedPeriod {
    pub key: PeriodKey,
    /// Tests per parameter (non-missing values).
    pub tests: Vec<u32>,
    /// Failed tests per parameter.
    pub failures: Vec<u32>,
    /// Raw excursion sums per parameter.
    pub excursion_sums: Vec<f64>,
    /// Readings folded in, measured or not.
    pub readings: usize,
}

impl ClosedPeriod {
    /// Sum of per-parameter test counts.
    pub fn total_tests(&self) -> u32 {
        self.tests.iter().sum()
    }

    /// Sum of per-parameter failure counts.
    pub fn total_failures(&self) -> u32 {
        self.failures.iter().sum()
    }

    /// Distinct parameters with at least one test.
    pub fn parameters_tested(&self) -> usize {
        self.tests.iter().filter(|&&n| n > 0).count()
    }

    /// Distinct parameters with at least one failure.
    pub fn parameters_failed(&self) -> usize {
        self.failures.iter().filter(|&&n| n > 0).count()
    }

    /// Excursion sum across all parameters and readings.
    pub fn total_excursion(&self) -> f64 {
        self.excursion_sums.iter().sum()
    }

    /// Mean excursion per test for the parameter at `index`; `None` when
    /// that parameter was never tested.
    pub fn average_excursion(&self, index: usize) -> Option<f64> {
        match (self.tests.get(index), self.excursion_sums.get(index)) {
            (Some(&n), Some(&sum)) if n > 0 => Some(sum / n as f64),
            _ => None,
        }
    }

    /// Failed fraction of tests for the parameter at `index`.
    pub fn failure_ratio(&self, index: usize) -> Option<f64> {
        match (self.tests.get(index), self.failures.get(index)) {
            (Some(&n), Some(&failed)) if n > 0 => Some(failed as f64 / n as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Drives the INIT → ACCUMULATING → CLOSED lifecycle over an ordered stream.
#[derive(Debug)]
pub struct PeriodAggregator {
    width: usize,
    current: Option<PeriodAccumulator>,
}

impl PeriodAggregator {
    pub fn new(width: usize) -> Self {
        PeriodAggregator {
            width,
            current: None,
        }
    }

    /// Folds one reading under `key`. Returns the previous period if this
    /// reading opened a new one.
    pub fn push(&mut self, key: PeriodKey, row: &RowClassification) -> Option<ClosedPeriod> {
        let closed = match self.current.take() {
            Some(acc) if *acc.key() == key => {
                self.current = Some(acc);
                None
            }
            Some(acc) => Some(acc.close()),
            None => None,
        };

        self.current
            .get_or_insert_with(|| PeriodAccumulator::new(key, self.width))
            .fold(row);
        closed
    }

    /// Ends the stream, closing the open period if any.
    pub fn finish(self) -> Option<ClosedPeriod> {
        self.current.map(PeriodAccumulator::close)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::classify::TestOutcome::{self, Fail, NotMeasured, Pass};
    use crate::period::PeriodGranularity;
    use chrono::NaiveDate;

    fn key(month: u32) -> PeriodKey {
        let ts = NaiveDate::from_ymd_opt(2023, month, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        PeriodGranularity::Month.key_for(&ts)
    }

    fn row(outcomes: Vec<TestOutcome>) -> RowClassification {
        RowClassification { outcomes }
    }

    #[test]
    fn test_fold_counts_only_measured_parameters() {
        let mut acc = PeriodAccumulator::new(key(7), 3);
        acc.fold(&row(vec![Pass, NotMeasured, Fail { excursion: 0.5 }]));
        acc.fold(&row(vec![NotMeasured, NotMeasured, Pass]));
        let closed = acc.close();

        assert_eq!(closed.tests, vec![1, 0, 2]);
        assert_eq!(closed.failures, vec![0, 0, 1]);
        assert_eq!(closed.total_tests(), 3, "non-missing values across both readings");
        assert_eq!(closed.total_failures(), 1);
        assert_eq!(closed.parameters_tested(), 2);
        assert_eq!(closed.readings, 2);
    }

    #[test]
    fn test_average_excursion_divides_by_parameter_tests() {
        let mut acc = PeriodAccumulator::new(key(7), 2);
        acc.fold(&row(vec![Fail { excursion: 0.6 }, NotMeasured]));
        acc.fold(&row(vec![Pass, NotMeasured]));
        acc.fold(&row(vec![Fail { excursion: 0.3 }, NotMeasured]));
        let closed = acc.close();

        let avg = closed.average_excursion(0).expect("parameter 0 was tested");
        assert!((avg - 0.3).abs() < 1e-9);
        assert_eq!(closed.average_excursion(1), None, "untested parameter has no average");
        assert!((closed.failure_ratio(0).unwrap() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregator_closes_on_key_change_and_starts_fresh() {
        let mut agg = PeriodAggregator::new(1);

        assert!(agg.push(key(7), &row(vec![Fail { excursion: 1.0 }])).is_none());
        assert!(agg.push(key(7), &row(vec![Pass])).is_none());

        let july = agg
            .push(key(8), &row(vec![Pass]))
            .expect("a new key should close July");
        assert_eq!(july.key, key(7));
        assert_eq!(july.tests, vec![2], "July holds exactly the first two readings");
        assert_eq!(july.failures, vec![1]);
        assert!((july.total_excursion() - 1.0).abs() < 1e-9);

        let august = agg.finish().expect("end of stream closes August");
        assert_eq!(august.key, key(8));
        assert_eq!(august.tests, vec![1]);
        assert_eq!(august.failures, vec![0], "no carry-over from July");
        assert_eq!(august.total_excursion(), 0.0);
    }

    #[test]
    fn test_fold_ignores_positions_beyond_width() {
        let mut acc = PeriodAccumulator::new(key(7), 1);
        acc.fold(&row(vec![Pass, Fail { excursion: 2.0 }]));
        let closed = acc.close();
        assert_eq!(closed.tests, vec![1]);
        assert_eq!(closed.total_failures(), 0);
        assert_eq!(closed.average_excursion(1), None);
        assert_eq!(closed.failure_ratio(1), None);
    }

    #[test]
    fn test_finish_on_empty_stream_yields_nothing() {
        assert!(PeriodAggregator::new(4).finish().is_none());
    }

    #[test]
    fn test_period_of_unmeasured_readings_has_zero_tests() {
        let mut agg = PeriodAggregator::new(2);
        agg.push(key(3), &row(vec![NotMeasured, NotMeasured]));
        let closed = agg.finish().unwrap();
        assert_eq!(closed.total_tests(), 0);
        assert_eq!(closed.readings, 1);
    }
}
