use crate::compose::Composer;
use crate::env::{env_var, LOG_FORMAT_PROFILE_ENV, LOG_FORMAT_SEVERITY_ENV};
use crate::error::{ConfigError, FormatError};
use crate::http_request::{HttpRequest, RequestSnapshot};
use crate::profile::{CoreFields, WireProfile};
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// Configuration of [`RequestLogFormatter`].
///
/// **Fields**
/// - `severity`: recorded on every line; defaults to `INFO`.
/// - `profile`: wire encoding; defaults to [`WireProfile::Text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestLogConfig {
    pub severity: Severity,
    pub profile: WireProfile,
}

impl Default for RequestLogConfig {
    fn default() -> Self {
        Self {
            severity: Severity::Info,
            profile: WireProfile::Text,
        }
    }
}

impl RequestLogConfig {
    /// Defaults overridden by `LOG_FORMAT_SEVERITY` and `LOG_FORMAT_PROFILE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(raw) = env_var(LOG_FORMAT_SEVERITY_ENV) {
            cfg.severity = raw
                .parse()
                .map_err(|_| ConfigError::InvalidSeverity(raw.clone()))?;
        }
        if let Some(raw) = env_var(LOG_FORMAT_PROFILE_ENV) {
            cfg.profile = raw.parse()?;
        }
        Ok(cfg)
    }
}

/// Formats one access-log line per handled request.
///
/// A line holds the `httpRequest` group plus `severity` and `timestamp`,
/// and ends with a newline:
///
/// ```text
/// {"httpRequest":{"requestMethod":"GET",...},"severity":"INFO","timestamp":"..."}
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLogFormatter {
    config: RequestLogConfig,
}

impl RequestLogFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RequestLogConfig) -> Self {
        Self { config }
    }

    /// Default configuration with every line recorded at `severity`.
    pub fn with_severity(severity: Severity) -> Self {
        Self::with_config(RequestLogConfig {
            severity,
            ..RequestLogConfig::default()
        })
    }

    pub fn config(&self) -> &RequestLogConfig {
        &self.config
    }

    /// Encode `snapshot` as one newline-terminated JSON line.
    pub fn try_format(&self, snapshot: &RequestSnapshot) -> Result<String, FormatError> {
        let profile = self.config.profile;
        let http_request = HttpRequest::from_snapshot(snapshot, profile);
        let core = CoreFields::new(profile, self.config.severity, snapshot.timestamp);

        let mut composer = Composer::new();
        composer
            .nest("httpRequest", &http_request)?
            .merge("core", &core)?;

        let mut line = composer.to_json_string()?;
        line.push('\n');
        Ok(line)
    }

    /// Like [`try_format`](Self::try_format), but an encoding failure is
    /// returned as the error text on its own line so the request still
    /// leaves a trace in the log.
    pub fn format(&self, snapshot: &RequestSnapshot) -> String {
        self.try_format(snapshot).unwrap_or_else(|err| {
            tracing::debug!(error = %err, "request log line fell back to error text");
            format!("{}\n", err)
        })
    }

    /// Plain closure form, for middleware that takes a formatting function.
    pub fn into_fn(self) -> impl Fn(&RequestSnapshot) -> String + Clone + Send + Sync + 'static {
        move |snapshot: &RequestSnapshot| self.format(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};
    use std::time::Duration;

    fn parse(line: &str) -> Value {
        assert!(line.ends_with('\n'));
        serde_json::from_str(line.trim_end()).unwrap()
    }

    #[test]
    fn default_line_contains_required_entries() {
        let snap = RequestSnapshot::new("GET", "http://test.url/");
        let out = RequestLogFormatter::new().format(&snap);

        assert_eq!(
            parse(&out),
            json!({
                "httpRequest": {
                    "requestMethod": "GET",
                    "requestUrl": "http://test.url/",
                    "status": 0,
                    "userAgent": "",
                    "remoteIp": "",
                    "latency": "0.000000s",
                    "protocol": "HTTP/1.1",
                    "responseSize": "0",
                },
                "severity": "INFO",
                "timestamp": "0001-01-01 00:00:00 +0000 UTC",
            })
        );
    }

    #[test]
    fn field_order_matches_wire_format() {
        let out = RequestLogFormatter::new().format(&RequestSnapshot::new("GET", "/"));
        let http = out.find("\"httpRequest\"").unwrap();
        let sev = out.find("\"severity\"").unwrap();
        let ts = out.find("\"timestamp\"").unwrap();
        assert!(http < sev && sev < ts, "{out}");
    }

    #[test]
    fn severity_option_applies_to_every_line() {
        let formatter = RequestLogFormatter::with_severity(Severity::Warning);
        for path in ["/a", "/b", "/c"] {
            let out = formatter.format(&RequestSnapshot::new("GET", path));
            assert!(out.contains(r#""severity":"WARNING""#), "{out}");
        }
    }

    #[test]
    fn proto_profile_uses_codes_and_omits_unset_values() {
        let formatter = RequestLogFormatter::with_config(RequestLogConfig {
            severity: Severity::Warning,
            profile: WireProfile::Proto,
        });

        let out = formatter.format(&RequestSnapshot::default());
        assert_eq!(out, "{\"severity\":400}\n");

        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let snap = RequestSnapshot::new("GET", "http://test.url/")
            .status(200)
            .latency(Duration::from_millis(20))
            .body_size(512)
            .timestamp(ts);
        assert_eq!(
            parse(&formatter.format(&snap)),
            json!({
                "httpRequest": {
                    "requestMethod": "GET",
                    "requestUrl": "http://test.url/",
                    "status": 200,
                    "latency": "0.020s",
                    "protocol": "HTTP/1.1",
                    "responseSize": 512,
                },
                "severity": 400,
                "timestamp": "2024-05-01T12:00:00Z",
            })
        );
    }

    #[test]
    fn closure_form_matches_method() {
        let formatter = RequestLogFormatter::with_severity(Severity::Debug);
        let f = formatter.into_fn();
        let snap = RequestSnapshot::new("DELETE", "/items/3").status(204);
        assert_eq!(f(&snap), formatter.format(&snap));
    }
}
