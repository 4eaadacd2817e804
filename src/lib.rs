/// CCME Water Quality Index scoring for environmental monitoring sites.
///
/// Modules, leaf-first:
/// - `model`      — readings, result records, letter scales, errors.
/// - `tolerances` — per-parameter tolerance rules in canonical order.
/// - `period`     — aggregation granularity and period keys.
/// - `config`     — TOML run configuration.
/// - `ingest`     — text rows → `Reading`s (sentinels, derived parameters).
/// - `analysis`   — classification, aggregation, sub-indices, WQI, filter.
/// - `pipeline`   — per-site and multi-site scoring runs.
/// - `logging`    — structured console/file logging.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod period;
pub mod pipeline;
pub mod tolerances;

pub use model::{Contributor, Grade, PeriodResult, Rating, Reading, WqiError};
pub use pipeline::{BatchReport, SiteSeries, WqiEngine};
