/// CCME scoring stages, leaf-first.
///
/// Submodules:
/// - `classify`  — per-reading pass/fail and excursion against the tolerance model.
/// - `aggregate` — period-scoped running totals over the ordered reading stream.
/// - `subindex`  — F1/F2/F3, per-parameter grades and the worst contributor.
/// - `composer`  — WQI value and rating from the three factors.
/// - `filter`    — drops under-sampled periods.

pub mod aggregate;
pub mod classify;
pub mod composer;
pub mod filter;
pub mod subindex;
