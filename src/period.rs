/// Aggregation periods and period keys.
///
/// A period key is the bucket a reading falls into under a configured
/// granularity. Keys are zero-padded so that lexical order matches
/// chronological order, which keeps result sets sortable after they are
/// concatenated across sites.

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Granularity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodGranularity {
    Day,
    Week,
    #[default]
    Month,
    Season,
    Year,
}

impl PeriodGranularity {
    /// Derives the period key for a timestamp.
    ///
    /// Seasons are numbered `month % 12 / 3 + 1`, so December opens season 1
    /// together with the following January and February. The key carries the
    /// December year so the three months share one bucket.
    pub fn key_for(self, timestamp: &NaiveDateTime) -> PeriodKey {
        let key = match self {
            PeriodGranularity::Day => timestamp.format("%Y-%m-%d").to_string(),
            PeriodGranularity::Week => timestamp.format("%Y-W%W").to_string(),
            PeriodGranularity::Month => timestamp.format("%Y-%m").to_string(),
            PeriodGranularity::Season => {
                let month = timestamp.month();
                let season = month % 12 / 3 + 1;
                let year = if month <= 2 {
                    timestamp.year() - 1
                } else {
                    timestamp.year()
                };
                format!("{:04}-S{}", year, season)
            }
            PeriodGranularity::Year => timestamp.format("%Y").to_string(),
        };
        PeriodKey(key)
    }
}

impl fmt::Display for PeriodGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PeriodGranularity::Day => "day",
            PeriodGranularity::Week => "week",
            PeriodGranularity::Month => "month",
            PeriodGranularity::Season => "season",
            PeriodGranularity::Year => "year",
        };
        write!(f, "{}", name)
    }
}

// ---------------------------------------------------------------------------
// Period key
// ---------------------------------------------------------------------------

/// Aggregation bucket identifier, e.g. `"2023-07"` for a month.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PeriodKey(String);

impl PeriodKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
