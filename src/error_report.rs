use crate::compose::Composer;
use crate::env::{
    env_or, env_var, LOG_FORMAT_PAYLOAD_ENV, LOG_FORMAT_PROFILE_ENV, LOG_FORMAT_SERVICE_ENV,
    LOG_FORMAT_VERSION_ENV,
};
use crate::error::{ConfigError, FormatError};
use crate::http_request::HttpRequest;
use crate::profile::{CoreFields, PayloadLayout, WireProfile};
use crate::record::LogEntry;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// `serviceContext` of an Error Reporting event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceContext {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub service: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
}

impl ServiceContext {
    pub fn is_empty(&self) -> bool {
        self.service.is_empty() && self.version.is_empty()
    }
}

/// Configuration of [`ErrorReportingFormatter`].
///
/// **Fields**
/// - `service`, `version`: reported on every record.
/// - `profile`: wire encoding; defaults to [`WireProfile::Proto`].
/// - `payload_layout`: where entry fields go; defaults to
///   [`PayloadLayout::Nested`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorReportingConfig {
    pub service: String,
    pub version: String,
    pub profile: WireProfile,
    pub payload_layout: PayloadLayout,
}

impl Default for ErrorReportingConfig {
    fn default() -> Self {
        Self {
            service: String::new(),
            version: String::new(),
            profile: WireProfile::Proto,
            payload_layout: PayloadLayout::Nested,
        }
    }
}

impl ErrorReportingConfig {
    /// Defaults overridden by the `LOG_FORMAT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self {
            service: env_or(LOG_FORMAT_SERVICE_ENV, ""),
            version: env_or(LOG_FORMAT_VERSION_ENV, ""),
            ..Self::default()
        };
        if let Some(raw) = env_var(LOG_FORMAT_PROFILE_ENV) {
            cfg.profile = raw.parse()?;
        }
        if let Some(raw) = env_var(LOG_FORMAT_PAYLOAD_ENV) {
            cfg.payload_layout = raw.parse()?;
        }
        Ok(cfg)
    }
}

/// Top-level keys a record owns. In the flat layout, payload fields with
/// these names are dropped so they cannot replace the structured values.
pub const RESERVED_KEYS: [&str; 6] = [
    "severity",
    "timestamp",
    "httpRequest",
    "serviceContext",
    "message",
    "stack_trace",
];

/// Error-event fields of a record.
#[derive(Serialize)]
struct ErrorEvent<'a> {
    #[serde(rename = "serviceContext", skip_serializing_if = "ServiceContext::is_empty")]
    service_context: &'a ServiceContext,
    #[serde(skip_serializing_if = "str::is_empty")]
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack_trace: Option<&'a str>,
}

/// Formats application log entries as Cloud Logging records that Error
/// Reporting can pick up.
///
/// The service and version given at construction are reported on every
/// record. A record merges, in order: the log-entry fields (`severity`,
/// `timestamp`, `httpRequest`), the error-event fields (`serviceContext`,
/// `message`, `stack_trace`) and the entry's payload. Groups with nothing in
/// them are left out.
#[derive(Debug, Clone)]
pub struct ErrorReportingFormatter {
    context: ServiceContext,
    profile: WireProfile,
    payload_layout: PayloadLayout,
}

impl ErrorReportingFormatter {
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self::with_config(ErrorReportingConfig {
            service: service.into(),
            version: version.into(),
            ..ErrorReportingConfig::default()
        })
    }

    pub fn with_config(config: ErrorReportingConfig) -> Self {
        Self {
            context: ServiceContext {
                service: config.service,
                version: config.version,
            },
            profile: config.profile,
            payload_layout: config.payload_layout,
        }
    }

    pub fn service_context(&self) -> &ServiceContext {
        &self.context
    }

    fn compose(&self, entry: &LogEntry) -> Result<Composer, FormatError> {
        let mut composer = Composer::new();

        composer.merge(
            "entry",
            &CoreFields::new(self.profile, entry.severity, entry.timestamp),
        )?;
        if let Some(snapshot) = &entry.http_request {
            composer.nest("httpRequest", &HttpRequest::from_snapshot(snapshot, self.profile))?;
        }

        composer.merge(
            "report",
            &ErrorEvent {
                service_context: &self.context,
                message: &entry.message,
                stack_trace: entry.stack_trace.as_deref(),
            },
        )?;

        match self.payload_layout {
            PayloadLayout::Nested => composer.nest("payload", &entry.fields)?,
            PayloadLayout::Flat => {
                composer.merge_except("payload", &entry.fields, &RESERVED_KEYS)?
            }
        };

        Ok(composer)
    }

    /// Encode `entry` as one newline-terminated JSON record.
    ///
    /// When `buf` is given it is cleared and reused for the output.
    pub fn format(&self, entry: &LogEntry, buf: Option<Vec<u8>>) -> Result<Vec<u8>, FormatError> {
        let mut out = buf.unwrap_or_default();
        out.clear();

        let composer = self.compose(entry).inspect_err(|err| {
            tracing::debug!(error = %err, "failed to compose error report");
        })?;
        composer.write_to(&mut out)?;
        out.push(b'\n');
        Ok(out)
    }

    /// Encode `entry` and write it to `writer`.
    pub fn write<W: Write>(&self, entry: &LogEntry, mut writer: W) -> Result<(), FormatError> {
        let record = self.format(entry, None)?;
        writer.write_all(&record)?;
        Ok(())
    }
}
