/// Structured logging for the WQI scoring service
///
/// Provides context-rich logging with pipeline component and site reference
/// tags, timestamps, and severity levels. Supports both console output
/// and file-based logging for batch runs.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::analysis::filter::DropReason;
use crate::model::WqiError;
use crate::period::PeriodKey;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Ingest,
    Classifier,
    Aggregator,
    Scoring,
    Filter,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Ingest => write!(f, "INGEST"),
            Component::Classifier => write!(f, "CLASSIFY"),
            Component::Aggregator => write!(f, "AGG"),
            Component::Scoring => write!(f, "SCORE"),
            Component::Filter => write!(f, "FILTER"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Bad input data for one site - other sites are unaffected
    Expected,
    /// Configuration problem - every site scored with it is suspect
    Unexpected,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
        }
    }
}

/// Classify a site-run failure by its error kind
pub fn classify_site_failure(err: &WqiError) -> FailureType {
    match err {
        WqiError::InvalidValue { .. } | WqiError::UnorderedReadings { .. } => FailureType::Expected,
        WqiError::Configuration(_) | WqiError::UnknownParameter(_) => FailureType::Unexpected,
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, component: Component, site: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let site_part = site.map(|s| format!(" [{}]", s)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, component, site_part, message)
    }

    fn log(&self, level: LogLevel, component: Component, site: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let log_entry = Self::format_entry(level, component, site, message);
        let site_part = site.map(|s| format!(" [{}]", s)).unwrap_or_default();

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, site_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, site_part, message),
                LogLevel::Info => println!("   {}{}: {}", component, site_part, message),
                LogLevel::Debug => println!("   [DEBUG] {}{}: {}", component, site_part, message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, component: Component, site: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, component, site, message);
        }
    }
}

pub fn info(component: Component, site: Option<&str>, message: &str) {
    emit(LogLevel::Info, component, site, message);
}

pub fn warn(component: Component, site: Option<&str>, message: &str) {
    emit(LogLevel::Warning, component, site, message);
}

pub fn error(component: Component, site: Option<&str>, message: &str) {
    emit(LogLevel::Error, component, site, message);
}

pub fn debug(component: Component, site: Option<&str>, message: &str) {
    emit(LogLevel::Debug, component, site, message);
}

// ---------------------------------------------------------------------------
// Structured Logging Helpers
// ---------------------------------------------------------------------------

/// Log a period that produced no result
pub fn log_period_dropped(reference: &str, period: &PeriodKey, reason: &DropReason) {
    let component = match reason {
        DropReason::NoTests => Component::Aggregator,
        DropReason::NoScore => Component::Scoring,
        DropReason::TooFewTests { .. } | DropReason::TooFewParameters { .. } => Component::Filter,
    };
    debug(component, Some(reference), &format!("period {} dropped: {}", period, reason));
}

/// Log a site run that aborted, with classification
pub fn log_site_failure(reference: &str, err: &WqiError) {
    let failure_type = classify_site_failure(err);
    let message = format!("scoring failed [{}]: {}", failure_type, err);

    match failure_type {
        FailureType::Expected => warn(Component::System, Some(reference), &message),
        FailureType::Unexpected => error(Component::System, Some(reference), &message),
    }
}

/// Log a summary of a multi-site run
pub fn log_run_summary(total: usize, successful: usize, failed: usize, periods: usize) {
    let message = format!(
        "Run complete: {}/{} sites scored, {} failed, {} periods reported",
        successful, total, failed, periods
    );

    if failed == 0 {
        info(Component::System, None, &message);
    } else if successful == 0 {
        error(Component::System, None, &message);
    } else {
        warn(Component::System, None, &message);
    }
}
