/// Row preparation: text cells → `Reading`.
///
/// Rules applied per row, in order:
///   1. ignored columns are dropped;
///   2. empty, "nan" and "null" cells are "not measured";
///   3. any other non-numeric cell is a value error;
///   4. derived parameters are summed from their components, which are
///      consumed;
///   5. a 0 in a `zero_is_missing` parameter is a sensor sentinel and
///      becomes "not measured";
///   6. any remaining column without a tolerance rule is a configuration
///      error.

use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use crate::config::{DerivedParameter, WqiConfig};
use crate::logging::{self, Component};
use crate::model::{Reading, WqiError};

// ---------------------------------------------------------------------------
// Input and rules
// ---------------------------------------------------------------------------

/// One export row with a parsed timestamp and raw `(column, cell)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct RawReading {
    pub timestamp: NaiveDateTime,
    pub fields: Vec<(String, String)>,
}

impl RawReading {
    pub fn new(timestamp: NaiveDateTime) -> Self {
        RawReading {
            timestamp,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, column: &str, cell: &str) -> Self {
        self.fields.push((column.to_string(), cell.to_string()));
        self
    }
}

/// Column handling derived from a `WqiConfig`.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestRules {
    scored: Vec<String>,
    zero_is_missing: Vec<String>,
    derived: Vec<DerivedParameter>,
    ignored: Vec<String>,
}

impl IngestRules {
    pub fn from_config(config: &WqiConfig) -> Self {
        IngestRules {
            scored: config.parameters.iter().map(|p| p.name.clone()).collect(),
            zero_is_missing: config
                .parameters
                .iter()
                .filter(|p| p.zero_is_missing)
                .map(|p| p.name.clone())
                .collect(),
            derived: config.derived.clone(),
            ignored: config.ignored_columns.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parses one cell. `Ok(None)` means "not measured".
pub fn parse_field(parameter: &str, cell: &str) -> Result<Option<f64>, WqiError> {
    let trimmed = cell.trim();
    if trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case("nan")
        || trimmed.eq_ignore_ascii_case("null")
    {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(WqiError::InvalidValue {
            parameter: parameter.to_string(),
            raw: cell.to_string(),
        }),
    }
}

/// Applies `rules` to one row.
pub fn prepare_reading(raw: &RawReading, rules: &IngestRules) -> Result<Reading, WqiError> {
    let mut parsed: BTreeMap<String, Option<f64>> = BTreeMap::new();
    for (column, cell) in &raw.fields {
        if rules.ignored.contains(column) {
            continue;
        }
        parsed.insert(column.clone(), parse_field(column, cell)?);
    }

    for derived in &rules.derived {
        let mut total: Option<f64> = None;
        for component in &derived.sum_of {
            if let Some(Some(v)) = parsed.remove(component) {
                if v >= 0.0 {
                    total = Some(total.unwrap_or(0.0) + v);
                }
            }
        }
        parsed.insert(derived.name.clone(), total);
    }

    for name in &rules.zero_is_missing {
        if let Some(slot) = parsed.get_mut(name) {
            if *slot == Some(0.0) {
                *slot = None;
            }
        }
    }

    if let Some(unknown) = parsed.keys().find(|k| !rules.scored.contains(k)) {
        return Err(WqiError::UnknownParameter(unknown.clone()));
    }

    Ok(Reading {
        timestamp: raw.timestamp,
        values: parsed,
    })
}

/// Prepares a whole site export, stopping at the first bad row.
pub fn prepare_readings(raws: &[RawReading], rules: &IngestRules) -> Result<Vec<Reading>, WqiError> {
    let mut readings = Vec::with_capacity(raws.len());
    for (row, raw) in raws.iter().enumerate() {
        match prepare_reading(raw, rules) {
            Ok(reading) => readings.push(reading),
            Err(e) => {
                logging::warn(
                    Component::Ingest,
                    None,
                    &format!("row {} at {} rejected: {}", row + 1, raw.timestamp, e),
                );
                return Err(e);
            }
        }
    }

    logging::debug(
        Component::Ingest,
        None,
        &format!("prepared {} readings", readings.len()),
    );
    Ok(readings)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
