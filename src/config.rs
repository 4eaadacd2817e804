//! Run configuration loaded from TOML.
//!
//! ```toml
//! ignored_columns = ["Enclosure Temperature"]
//!
//! [analysis]
//! period = "month"
//! min_tests = 120
//! min_parameters = 2
//!
//! [[parameters]]
//! name = "pH"
//! min = 6.8
//! max = 8.0
//! zero_is_missing = true
//!
//! [[derived]]
//! name = "Total Nitrogen Approximation"
//! sum_of = ["Nitrate Concentration", "Nitrite Concentration"]
//! ```
//!
//! Parameter order in the file is the canonical order of the tolerance model.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use crate::analysis::filter::PeriodFilter;
use crate::model::WqiError;
use crate::period::PeriodGranularity;
use crate::tolerances::{DEFAULT_TOLERANCES, ParameterRule, ToleranceModel, ToleranceRule};

/// Environment variable naming the config file for `load_config_from_env`.
pub const CONFIG_ENV_VAR: &str = "WQI_CONFIG";

// ---------------------------------------------------------------------------
// Config sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub period: PeriodGranularity,
    pub min_tests: u32,
    pub min_parameters: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        let filter = PeriodFilter::default();
        AnalysisSettings {
            period: PeriodGranularity::Month,
            min_tests: filter.min_tests,
            min_parameters: filter.min_parameters,
        }
    }
}

/// One `[[parameters]]` entry. `max` alone is an upper-bound rule; `min`
/// and `max` together are a range rule.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParameterConfig {
    pub name: String,
    pub max: f64,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub zero_is_missing: bool,
}

impl ParameterConfig {
    pub fn rule(&self) -> ToleranceRule {
        match self.min {
            Some(low) => ToleranceRule::Range { low, high: self.max },
            None => ToleranceRule::UpperBound(self.max),
        }
    }
}

/// A parameter computed at ingestion as the sum of raw component columns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DerivedParameter {
    pub name: String,
    pub sum_of: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WqiConfig {
    #[serde(default)]
    pub analysis: AnalysisSettings,
    pub parameters: Vec<ParameterConfig>,
    #[serde(default)]
    pub derived: Vec<DerivedParameter>,
    #[serde(default)]
    pub ignored_columns: Vec<String>,
}

impl Default for WqiConfig {
    /// The EcoDetection export layout: nitrate and nitrite fold into total
    /// nitrogen, and the unscored ion and enclosure columns are ignored.
    fn default() -> Self {
        WqiConfig {
            analysis: AnalysisSettings::default(),
            parameters: DEFAULT_TOLERANCES
                .iter()
                .map(|e| {
                    let (min, max) = match e.rule {
                        ToleranceRule::UpperBound(bound) => (None, bound),
                        ToleranceRule::Range { low, high } => (Some(low), high),
                    };
                    ParameterConfig {
                        name: e.parameter.to_string(),
                        max,
                        min,
                        zero_is_missing: e.zero_is_missing,
                    }
                })
                .collect(),
            derived: vec![DerivedParameter {
                name: "Total Nitrogen Approximation".to_string(),
                sum_of: vec![
                    "Nitrate Concentration".to_string(),
                    "Nitrite Concentration".to_string(),
                ],
            }],
            ignored_columns: [
                "Enclosure Temperature",
                "Chloride Concentration",
                "Fluoride Concentration",
                "Sulphate Concentration",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl WqiConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, WqiError> {
        let config: WqiConfig =
            toml::from_str(text).map_err(|e| WqiError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the rules form a valid tolerance model and that every
    /// derived parameter is scored.
    pub fn validate(&self) -> Result<(), WqiError> {
        let model = self.tolerance_model()?;
        for derived in &self.derived {
            if !model.contains(&derived.name) {
                return Err(WqiError::Configuration(format!(
                    "derived parameter '{}' has no tolerance rule",
                    derived.name
                )));
            }
            if derived.sum_of.is_empty() {
                return Err(WqiError::Configuration(format!(
                    "derived parameter '{}' has no components",
                    derived.name
                )));
            }
        }
        Ok(())
    }

    pub fn tolerance_model(&self) -> Result<ToleranceModel, WqiError> {
        ToleranceModel::new(
            self.parameters
                .iter()
                .map(|p| ParameterRule {
                    name: p.name.clone(),
                    rule: p.rule(),
                })
                .collect(),
        )
    }

    pub fn period_filter(&self) -> PeriodFilter {
        PeriodFilter {
            min_tests: self.analysis.min_tests,
            min_parameters: self.analysis.min_parameters,
        }
    }
}

/// Loads a config file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<WqiConfig, WqiError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        WqiError::Configuration(format!("cannot read {}: {}", path.display(), e))
    })?;
    WqiConfig::from_toml_str(&text)
}

/// Loads the file named by `WQI_CONFIG` (a local `.env` is honoured), or the
/// built-in defaults when the variable is unset.
pub fn load_config_from_env() -> Result<WqiConfig, WqiError> {
    dotenv::dotenv().ok();
    match env::var(CONFIG_ENV_VAR) {
        Ok(path) => load_config(path),
        Err(_) => Ok(WqiConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
