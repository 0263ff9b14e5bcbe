//! Error types for the settings tree.
//!
//! Lookups and merges never fail; these errors only surface from template
//! handlers, strict type coercion and format sources.

use thiserror::Error;

/// Errors raised while resolving expressions or loading trees.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Missing argument {index} for '{handler}' expression")]
    MissingArgument { handler: &'static str, index: usize },

    #[error("Invalid argument '{value}' for '{handler}' expression: {reason}")]
    InvalidArgument {
        handler: &'static str,
        value: String,
        reason: String,
    },

    #[error("No arithmetic evaluator available for the math expression")]
    MissingEvaluator,

    #[error("Failed to evaluate '{expression}': {message}")]
    Evaluation { expression: String, message: String },

    #[error("Expression nesting exceeded the limit of {0}")]
    DepthExceeded(usize),

    #[error("Unknown settings format: {0}")]
    UnknownFormat(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SettingsError {
    pub fn missing_argument(handler: &'static str, index: usize) -> Self {
        Self::MissingArgument { handler, index }
    }

    pub fn invalid_argument(
        handler: &'static str,
        value: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::InvalidArgument {
            handler,
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    pub fn evaluation(expression: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Evaluation {
            expression: expression.into(),
            message: message.into(),
        }
    }
}

/// Errors raised by strict type parsers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("Cannot convert '{value}' into {target}")]
    InvalidNumber { value: String, target: &'static str },

    #[error("Invalid UUID '{0}'")]
    InvalidUuid(String),
}

/// Errors raised by format sources while reading or writing text.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlRead(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Document root must be a map, found {0}")]
    NotAMap(&'static str),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;
