use crate::compose::Payload;
use crate::http_request::RequestSnapshot;
use crate::severity::Severity;
use crate::stack::{format_stack, Traceable};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::error::Error;

/// A single log call as handed over by the logging front-end.
#[derive(Debug, Default)]
pub struct LogEntry {
    pub message: String,
    pub severity: Severity,
    pub timestamp: Option<DateTime<Utc>>,
    pub fields: Payload,
    /// Rendered stack dump, usually from [`format_stack`].
    pub stack_trace: Option<String>,
    pub http_request: Option<RequestSnapshot>,
}

impl LogEntry {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
            ..Self::default()
        }
    }

    pub fn at(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn field<T>(mut self, key: impl Into<String>, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        self.fields.insert_value(key, value);
        self
    }

    pub fn error_field<E>(mut self, key: impl Into<String>, err: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        self.fields.insert_error(key, err);
        self
    }

    pub fn with_stack_trace(mut self, dump: impl Into<String>) -> Self {
        self.stack_trace = Some(dump.into());
        self
    }

    /// Render the innermost stack of `err` and attach it. Nothing is attached
    /// when the chain carries no stack.
    pub fn with_stack_of(mut self, err: &dyn Traceable) -> Self {
        let dump = format_stack(Some(err));
        if !dump.is_empty() {
            self.stack_trace = Some(String::from_utf8_lossy(&dump).into_owned());
        }
        self
    }

    pub fn with_http_request(mut self, snapshot: RequestSnapshot) -> Self {
        self.http_request = Some(snapshot);
        self
    }
}
