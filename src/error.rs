//! Error types, one enum per subsystem.

use thiserror::Error;

/// Missing or invalid settings. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Failures while fetching a snapshot from the weather API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request failed with status: {0}")]
    Status(reqwest::StatusCode),

    #[error("unexpected data from weather API: {0}")]
    DataShape(String),
}

/// A single rule could not be evaluated. The rule is skipped, the batch continues.
#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("rule {rule_id}: threshold '{value}' is not a number")]
    InvalidThreshold { rule_id: i64, value: String },

    #[error("rule {rule_id}: operator '{operator}' cannot be applied to '{condition_type}'")]
    OperatorMismatch {
        rule_id: i64,
        condition_type: String,
        operator: String,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("referential integrity violated: {0}")]
    Referential(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no history to export")]
    Empty,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
