/// Error type returned when a record cannot be composed or written.
///
/// This is the only failure the formatters surface. A missing stack trace or
/// a frame without symbol data is never reported here; those degrade to a
/// shorter (or empty) dump instead.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("failed to marshal fields to JSON: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("sub-record `{part}` did not serialize to a JSON object")]
    NotAnObject { part: &'static str },

    #[error("failed to write record: {0}")]
    Write(#[from] std::io::Error),
}

/// Error type returned when building a formatter configuration from the
/// environment.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid severity: {0}")]
    InvalidSeverity(String),

    #[error("invalid wire profile: {0} (expected `text` or `proto`)")]
    InvalidProfile(String),

    #[error("invalid payload layout: {0} (expected `nested` or `flat`)")]
    InvalidLayout(String),
}

/// Returned by the strict [`FromStr`](std::str::FromStr) implementation of
/// [`Severity`](crate::severity::Severity).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown severity name `{0}`")]
pub struct ParseSeverityError(pub String);
