use crate::error::ConfigError;
use crate::severity::{Severity, SeverityCode};
use crate::time::{proto_timestamp, text_timestamp};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Selects how a record is encoded on the wire.
///
/// - `Text`: severity as its name, timestamps and durations as strings, every
///   field emitted even when zero.
/// - `Proto`: the protobuf JSON mapping of `google.logging.v2.LogEntry`.
///   Severity is the numeric code, timestamps are RFC 3339, durations use
///   the `"1.500s"` form, and zero or unset fields are omitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireProfile {
    #[default]
    Text,
    Proto,
}

impl FromStr for WireProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(WireProfile::Text),
            "proto" => Ok(WireProfile::Proto),
            _ => Err(ConfigError::InvalidProfile(s.to_string())),
        }
    }
}

/// Where caller-supplied fields land in an error-reporting record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadLayout {
    /// Under a single `"payload"` object.
    #[default]
    Nested,
    /// Merged at the top level next to `message` and `severity`.
    Flat,
}

impl FromStr for PayloadLayout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nested" => Ok(PayloadLayout::Nested),
            "flat" => Ok(PayloadLayout::Flat),
            _ => Err(ConfigError::InvalidLayout(s.to_string())),
        }
    }
}

/// Severity and timestamp of a record, encoded for one profile.
#[derive(Debug, Serialize)]
pub(crate) struct CoreFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<SeverityField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum SeverityField {
    Name(Severity),
    Code(SeverityCode),
}

impl CoreFields {
    pub(crate) fn new(profile: WireProfile, severity: Severity, ts: Option<DateTime<Utc>>) -> Self {
        match profile {
            WireProfile::Text => CoreFields {
                severity: Some(SeverityField::Name(severity)),
                timestamp: Some(text_timestamp(ts)),
            },
            // DEFAULT is the proto3 zero value and is left out.
            WireProfile::Proto => CoreFields {
                severity: (severity != Severity::Default)
                    .then_some(SeverityField::Code(SeverityCode(severity))),
                timestamp: ts.map(proto_timestamp),
            },
        }
    }
}
