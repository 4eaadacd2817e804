/// Core data types for the CCME water quality index service.
///
/// This module defines the shared domain model imported by all other modules:
/// readings as they enter the scoring pipeline, the per-period result records
/// that leave it, the letter scales, and the error type.

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::period::PeriodKey;

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Worst-contributor label reported when no parameter left its tolerance.
pub const ALL_WITHIN_RANGE: &str = "All values within range";

/// Grade label for a parameter that was not tested in a period.
pub const NOT_ASSESSED: &str = "NA";

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// One timestamped observation from a monitoring site.
///
/// `values` maps parameter name to its measurement. `None` (or an absent key)
/// means the parameter was not measured in this reading, which is distinct
/// from a measured value that happens to be in range.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub values: BTreeMap<String, Option<f64>>,
}

impl Reading {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        Reading {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style helper that records a measured value.
    pub fn with_value(mut self, parameter: &str, value: f64) -> Self {
        self.values.insert(parameter.to_string(), Some(value));
        self
    }

    /// Builder-style helper that records an explicit "not measured" entry.
    pub fn with_missing(mut self, parameter: &str) -> Self {
        self.values.insert(parameter.to_string(), None);
        self
    }

    /// The measured value for `parameter`, if any.
    pub fn value(&self, parameter: &str) -> Option<f64> {
        self.values.get(parameter).copied().flatten()
    }

    /// Number of parameters actually measured in this reading.
    pub fn measured_count(&self) -> usize {
        self.values.values().filter(|v| v.is_some()).count()
    }
}

// ---------------------------------------------------------------------------
// Letter scales
// ---------------------------------------------------------------------------

/// Overall WQI rating band.
///
/// `F` is part of the published scale ("0, not a valid computed score") but
/// the banding in `Rating::from_wqi` never produces it: `E` is the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rating {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Rating {
    /// Bands a computed WQI: ≥95 A, ≥80 B, ≥65 C, ≥45 D, otherwise E.
    pub fn from_wqi(wqi: f64) -> Self {
        if wqi >= 95.0 {
            Rating::A
        } else if wqi >= 80.0 {
            Rating::B
        } else if wqi >= 65.0 {
            Rating::C
        } else if wqi >= 45.0 {
            Rating::D
        } else {
            Rating::E
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Rating::A => "A",
            Rating::B => "B",
            Rating::C => "C",
            Rating::D => "D",
            Rating::E => "E",
            Rating::F => "F",
        };
        write!(f, "{}", letter)
    }
}

/// Per-parameter grade for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
    /// The parameter had no tests in the period.
    NotAssessed,
}

impl Grade {
    /// Bands a grade score (average excursion + failure ratio).
    pub fn from_score(score: f64) -> Self {
        if score <= 0.05 {
            Grade::A
        } else if score <= 0.2 {
            Grade::B
        } else if score <= 0.35 {
            Grade::C
        } else if score <= 0.55 {
            Grade::D
        } else if score <= 1.0 {
            Grade::E
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
            Grade::NotAssessed => NOT_ASSESSED,
        };
        write!(f, "{}", label)
    }
}

/// The parameter that degraded a period's quality the most.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Contributor {
    Parameter(String),
    AllWithinRange,
}

impl fmt::Display for Contributor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contributor::Parameter(name) => write!(f, "{}", name),
            Contributor::AllWithinRange => write!(f, "{}", ALL_WITHIN_RANGE),
        }
    }
}

fn serialize_display<T: fmt::Display, S: Serializer>(value: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(value)
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        serialize_display(self, s)
    }
}

impl Serialize for Grade {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        serialize_display(self, s)
    }
}

impl Serialize for Contributor {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        serialize_display(self, s)
    }
}

// ---------------------------------------------------------------------------
// Result records
// ---------------------------------------------------------------------------

/// Grade for one parameter, kept in canonical parameter order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterGrade {
    pub parameter: String,
    pub grade: Grade,
}

/// One scored period for one site. `(reference, period)` is the identity key
/// across concatenated result sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodResult {
    pub period: PeriodKey,
    pub reference: String,
    pub f1: f64,
    pub f2: f64,
    pub f3: f64,
    pub wqi: f64,
    pub rating: Rating,
    pub grades: Vec<ParameterGrade>,
    pub worst_contributor: Contributor,
    pub total_tests: u32,
    pub parameters_tested: usize,
}

impl PeriodResult {
    /// Looks up the grade for a parameter by name.
    pub fn grade_for(&self, parameter: &str) -> Option<Grade> {
        self.grades
            .iter()
            .find(|g| g.parameter == parameter)
            .map(|g| g.grade)
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that abort scoring for a site.
#[derive(Debug, Clone, PartialEq)]
pub enum WqiError {
    /// Invalid or unreadable configuration (tolerances, thresholds, sites).
    Configuration(String),
    /// A reading names a parameter that has no tolerance rule.
    UnknownParameter(String),
    /// A value is present but is not a usable number.
    InvalidValue { parameter: String, raw: String },
    /// Readings are not in ascending timestamp order.
    UnorderedReadings {
        previous: NaiveDateTime,
        next: NaiveDateTime,
    },
}

impl fmt::Display for WqiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WqiError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            WqiError::UnknownParameter(name) => {
                write!(f, "Configuration error: no tolerance rule for parameter '{}'", name)
            }
            WqiError::InvalidValue { parameter, raw } => {
                write!(f, "Value error: '{}' is not a valid value for {}", raw, parameter)
            }
            WqiError::UnorderedReadings { previous, next } => write!(
                f,
                "Unordered readings: {} follows {}",
                next, previous
            ),
        }
    }
}

impl std::error::Error for WqiError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
