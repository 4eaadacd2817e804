/// Tolerance model for water quality parameters.
///
/// Defines the acceptable range for each monitored parameter and the
/// canonical parameter order used for every per-parameter vector downstream
/// (test counts, failure counts, grades, worst-contributor tie-breaks).
/// `DEFAULT_TOLERANCES` is the built-in rule set for EcoDetection sensor
/// exports; other rule sets come from `config`.

use crate::model::WqiError;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Pass/fail boundary for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToleranceRule {
    /// Fails when the value is above the bound.
    UpperBound(f64),
    /// Fails when the value is below `low` or above `high`.
    Range { low: f64, high: f64 },
}

impl ToleranceRule {
    /// Bounds must be positive (excursions divide by them) and ranges ordered.
    pub fn validate(&self, parameter: &str) -> Result<(), WqiError> {
        match *self {
            ToleranceRule::UpperBound(bound) => {
                if !(bound.is_finite() && bound > 0.0) {
                    return Err(WqiError::Configuration(format!(
                        "upper bound for '{}' must be a positive number, got {}",
                        parameter, bound
                    )));
                }
            }
            ToleranceRule::Range { low, high } => {
                if !(low.is_finite() && high.is_finite() && low > 0.0) {
                    return Err(WqiError::Configuration(format!(
                        "range for '{}' must have positive finite bounds, got [{}, {}]",
                        parameter, low, high
                    )));
                }
                if low >= high {
                    return Err(WqiError::Configuration(format!(
                        "range for '{}' is inverted: [{}, {}]",
                        parameter, low, high
                    )));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Built-in rule set
// ---------------------------------------------------------------------------

/// One entry of a static rule table.
pub struct ToleranceEntry {
    pub parameter: &'static str,
    pub rule: ToleranceRule,
    /// A reported 0 is a sensor sentinel, not a measurement.
    pub zero_is_missing: bool,
}

/// Environmental reference standard bounds for the EcoDetection parameter
/// set, in canonical order. Nutrient bounds are in ppb; oxygen is the range
/// calculated at 20 °C.
pub static DEFAULT_TOLERANCES: &[ToleranceEntry] = &[
    ToleranceEntry {
        parameter: "Total Nitrogen Approximation",
        rule: ToleranceRule::UpperBound(1050.0),
        zero_is_missing: false,
    },
    ToleranceEntry {
        parameter: "Phosphate",
        rule: ToleranceRule::UpperBound(165.0),
        zero_is_missing: false,
    },
    ToleranceEntry {
        parameter: "Conductivity",
        rule: ToleranceRule::UpperBound(2000.0),
        zero_is_missing: false,
    },
    ToleranceEntry {
        parameter: "Turbidity",
        rule: ToleranceRule::UpperBound(15.0),
        zero_is_missing: false,
    },
    ToleranceEntry {
        parameter: "Oxygen",
        rule: ToleranceRule::Range { low: 5.4, high: 10.1 },
        zero_is_missing: true,
    },
    ToleranceEntry {
        parameter: "pH",
        rule: ToleranceRule::Range { low: 6.8, high: 8.0 },
        zero_is_missing: true,
    },
];

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A parameter and its rule, at a fixed position in the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterRule {
    pub name: String,
    pub rule: ToleranceRule,
}

/// Ordered, immutable set of tolerance rules for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ToleranceModel {
    parameters: Vec<ParameterRule>,
}

impl ToleranceModel {
    /// Builds a model from rules in canonical order.
    ///
    /// Fails on an empty set, a duplicate name or an invalid rule.
    pub fn new(parameters: Vec<ParameterRule>) -> Result<Self, WqiError> {
        if parameters.is_empty() {
            return Err(WqiError::Configuration(
                "tolerance model needs at least one parameter".to_string(),
            ));
        }
        for (i, p) in parameters.iter().enumerate() {
            p.rule.validate(&p.name)?;
            if parameters[..i].iter().any(|q| q.name == p.name) {
                return Err(WqiError::Configuration(format!(
                    "duplicate tolerance rule for '{}'",
                    p.name
                )));
            }
        }
        Ok(ToleranceModel { parameters })
    }

    /// The built-in EcoDetection rule set.
    pub fn ecod_default() -> Self {
        ToleranceModel {
            parameters: DEFAULT_TOLERANCES
                .iter()
                .map(|e| ParameterRule {
                    name: e.parameter.to_string(),
                    rule: e.rule,
                })
                .collect(),
        }
    }

    /// Returns the rule for `parameter`, or `UnknownParameter`.
    pub fn rule_for(&self, parameter: &str) -> Result<ToleranceRule, WqiError> {
        self.parameters
            .iter()
            .find(|p| p.name == parameter)
            .map(|p| p.rule)
            .ok_or_else(|| WqiError::UnknownParameter(parameter.to_string()))
    }

    /// Canonical position of `parameter`, if it has a rule.
    pub fn index_of(&self, parameter: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name == parameter)
    }

    pub fn contains(&self, parameter: &str) -> bool {
        self.index_of(parameter).is_some()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Rules in canonical order.
    pub fn parameters(&self) -> &[ParameterRule] {
        &self.parameters
    }

    /// Parameter names in canonical order.
    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
