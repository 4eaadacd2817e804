/// Site-level scoring pipeline.
///
/// `WqiEngine` runs one ordered pass per site:
///   readings → classification → period aggregation → sub-indices →
///   WQI → sampling filter → `PeriodResult`s in period order.
///
/// Sites share nothing but the immutable engine, so each site's run is
/// independent; `score_sites` processes them in input order and isolates a
/// failing site from the rest of the batch.

use chrono::NaiveDateTime;

use crate::analysis::aggregate::{ClosedPeriod, PeriodAggregator};
use crate::analysis::classify::classify;
use crate::analysis::composer::compose;
use crate::analysis::filter::{DropReason, PeriodFilter};
use crate::analysis::subindex::{self, SubIndices};
use crate::config::WqiConfig;
use crate::logging::{self, Component};
use crate::model::{PeriodResult, Reading, WqiError};
use crate::period::PeriodGranularity;
use crate::tolerances::ToleranceModel;

// ---------------------------------------------------------------------------
// Batch types
// ---------------------------------------------------------------------------

/// All readings for one site, tagged with its reference code.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSeries {
    pub reference: String,
    pub readings: Vec<Reading>,
}

/// A site whose run aborted.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteFailure {
    pub reference: String,
    pub error: WqiError,
}

/// Combined output of a multi-site run. `results` holds every surviving
/// site's periods, site by site in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub results: Vec<PeriodResult>,
    pub failures: Vec<SiteFailure>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WqiEngine {
    model: ToleranceModel,
    granularity: PeriodGranularity,
    filter: PeriodFilter,
}

impl WqiEngine {
    pub fn new(model: ToleranceModel, granularity: PeriodGranularity, filter: PeriodFilter) -> Self {
        WqiEngine {
            model,
            granularity,
            filter,
        }
    }

    pub fn from_config(config: &WqiConfig) -> Result<Self, WqiError> {
        config.validate()?;
        Ok(WqiEngine::new(
            config.tolerance_model()?,
            config.analysis.period,
            config.period_filter(),
        ))
    }

    pub fn model(&self) -> &ToleranceModel {
        &self.model
    }

    pub fn granularity(&self) -> PeriodGranularity {
        self.granularity
    }

    /// Scores one site's readings, which must be in ascending timestamp
    /// order. Any classification error aborts the whole site.
    pub fn score_site(&self, reference: &str, readings: &[Reading]) -> Result<Vec<PeriodResult>, WqiError> {
        let periods = self.aggregate(readings)?;
        let closed_count = periods.len();

        let mut results = Vec::with_capacity(closed_count);
        for period in &periods {
            match self.score_period(reference, period) {
                Ok(result) => results.push(result),
                Err(reason) => logging::log_period_dropped(reference, &period.key, &reason),
            }
        }

        logging::info(
            Component::Scoring,
            Some(reference),
            &format!(
                "{} readings, {} {} periods, {} reported",
                readings.len(),
                closed_count,
                self.granularity,
                results.len()
            ),
        );
        Ok(results)
    }

    /// Classifies and folds the readings into closed periods, in order.
    pub fn aggregate(&self, readings: &[Reading]) -> Result<Vec<ClosedPeriod>, WqiError> {
        let mut aggregator = PeriodAggregator::new(self.model.len());
        let mut closed = Vec::new();
        let mut previous: Option<NaiveDateTime> = None;

        for reading in readings {
            if let Some(prev) = previous {
                if reading.timestamp < prev {
                    return Err(WqiError::UnorderedReadings {
                        previous: prev,
                        next: reading.timestamp,
                    });
                }
            }
            previous = Some(reading.timestamp);

            let row = classify(reading, &self.model)?;
            let key = self.granularity.key_for(&reading.timestamp);
            closed.extend(aggregator.push(key, &row));
        }
        closed.extend(aggregator.finish());
        Ok(closed)
    }

    /// Turns one closed period into a result, or explains why it has none.
    pub fn score_period(&self, reference: &str, period: &ClosedPeriod) -> Result<PeriodResult, DropReason> {
        if period.total_tests() == 0 {
            return Err(DropReason::NoTests);
        }

        let factors = SubIndices::compute(period);
        let wqi = compose(&factors).ok_or(DropReason::NoScore)?;
        self.filter.check(period)?;

        if wqi.value < 0.0 {
            logging::warn(
                Component::Scoring,
                Some(reference),
                &format!("period {} has negative WQI {:.3}", period.key, wqi.value),
            );
        }

        Ok(PeriodResult {
            period: period.key.clone(),
            reference: reference.to_string(),
            f1: wqi.f1,
            f2: wqi.f2,
            f3: wqi.f3,
            wqi: wqi.value,
            rating: wqi.rating,
            grades: subindex::grades(period, &self.model),
            worst_contributor: subindex::worst_contributor(period, &self.model),
            total_tests: period.total_tests(),
            parameters_tested: period.parameters_tested(),
        })
    }

    /// Scores several sites. A failing site is recorded and skipped; a
    /// repeated reference is rejected so result keys stay unique.
    pub fn score_sites(&self, sites: &[SiteSeries]) -> BatchReport {
        let mut report = BatchReport::default();
        let mut seen: Vec<&str> = Vec::new();

        for site in sites {
            let outcome = if seen.contains(&site.reference.as_str()) {
                Err(WqiError::Configuration(format!(
                    "duplicate site reference '{}'",
                    site.reference
                )))
            } else {
                seen.push(&site.reference);
                self.score_site(&site.reference, &site.readings)
            };

            match outcome {
                Ok(results) => report.results.extend(results),
                Err(error) => {
                    logging::log_site_failure(&site.reference, &error);
                    report.failures.push(SiteFailure {
                        reference: site.reference.clone(),
                        error,
                    });
                }
            }
        }

        logging::log_run_summary(
            sites.len(),
            sites.len() - report.failures.len(),
            report.failures.len(),
            report.results.len(),
        );
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tolerances::{ParameterRule, ToleranceRule};
    use chrono::{Duration, NaiveDate};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn open_engine() -> WqiEngine {
        let model = ToleranceModel::new(vec![
            ParameterRule { name: "Turbidity".into(), rule: ToleranceRule::UpperBound(100.0) },
            ParameterRule { name: "pH".into(), rule: ToleranceRule::Range { low: 6.8, high: 8.0 } },
        ])
        .unwrap();
        WqiEngine::new(
            model,
            PeriodGranularity::Month,
            PeriodFilter { min_tests: 0, min_parameters: 0 },
        )
    }

    #[test]
    fn test_overflowing_excursion_aborts_site_instead_of_emitting_nan() {
        let model = ToleranceModel::new(vec![ParameterRule {
            name: "Oxygen".into(),
            rule: ToleranceRule::Range { low: 5.4, high: 10.1 },
        }])
        .unwrap();
        let engine = WqiEngine::new(
            model,
            PeriodGranularity::Month,
            PeriodFilter { min_tests: 0, min_parameters: 0 },
        );
        let readings = vec![Reading::new(start()).with_value("Oxygen", 1e-310)];

        let result = engine.score_site("cw_a", &readings);
        assert!(
            matches!(result, Err(WqiError::InvalidValue { ref parameter, .. }) if parameter == "Oxygen"),
            "got {:?}",
            result
        );
    }

    #[test]
    fn test_overflowed_period_totals_are_dropped_as_unscored() {
        let engine = open_engine();
        let periods = engine
            .aggregate(&[Reading::new(start()).with_value("Turbidity", 150.0)])
            .unwrap();
        let mut overflowed = periods[0].clone();
        overflowed.excursion_sums[0] = f64::INFINITY;
        assert_eq!(engine.score_period("cw_a", &overflowed), Err(DropReason::NoScore));
    }

    #[test]
    fn test_unordered_readings_are_rejected() {
        let readings = vec![
            Reading::new(start() + Duration::hours(2)).with_value("pH", 7.0),
            Reading::new(start()).with_value("pH", 7.0),
        ];
        let result = open_engine().score_site("cw_a", &readings);
        assert!(matches!(result, Err(WqiError::UnorderedReadings { .. })));
    }

    #[test]
    fn test_equal_timestamps_are_accepted() {
        let readings = vec![
            Reading::new(start()).with_value("pH", 7.0),
            Reading::new(start()).with_value("pH", 7.1),
        ];
        let results = open_engine().score_site("cw_a", &readings).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].total_tests, 2);
    }

    #[test]
    fn test_period_without_tests_is_not_emitted() {
        let readings = vec![
            Reading::new(start()).with_missing("pH"),
            Reading::new(start() + Duration::days(31)).with_value("pH", 7.0),
        ];
        let results = open_engine().score_site("cw_a", &readings).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].period.as_str(), "2023-08");
    }

    #[test]
    fn test_score_period_reports_no_tests_reason() {
        let engine = open_engine();
        let periods = engine
            .aggregate(&[Reading::new(start()).with_missing("Turbidity")])
            .unwrap();
        assert_eq!(engine.score_period("cw_a", &periods[0]), Err(DropReason::NoTests));
    }

    #[test]
    fn test_default_filter_drops_sparse_period() {
        let engine = WqiEngine::from_config(&WqiConfig::default()).unwrap();
        let readings: Vec<_> = (0..10)
            .map(|h| Reading::new(start() + Duration::hours(h)).with_value("pH", 7.0))
            .collect();
        assert!(engine.score_site("cw_a", &readings).unwrap().is_empty());
    }

    #[test]
    fn test_score_sites_isolates_failures_and_rejects_duplicates() {
        let good = vec![Reading::new(start()).with_value("pH", 7.0)];
        let bad = vec![Reading::new(start()).with_value("Salinity", 3.0)];
        let sites = vec![
            SiteSeries { reference: "cw_a".into(), readings: good.clone() },
            SiteSeries { reference: "cw_b".into(), readings: bad },
            SiteSeries { reference: "cw_a".into(), readings: good },
        ];

        let report = open_engine().score_sites(&sites);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].reference, "cw_a");
        assert_eq!(report.failures.len(), 2);
        assert_eq!(
            report.failures[0].error,
            WqiError::UnknownParameter("Salinity".into())
        );
        assert!(matches!(report.failures[1].error, WqiError::Configuration(_)));
    }
}
