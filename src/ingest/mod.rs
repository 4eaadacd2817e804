/// Preparation of parsed sensor-export rows into scoring `Reading`s.
///
/// File discovery, CSV parsing and timestamp formats are the caller's
/// concern; this layer starts from rows whose timestamp is already parsed
/// and whose cells are still text.
///
/// Submodules:
/// - `prepare` — numeric parsing, sentinel handling, derived parameters.

pub mod prepare;
