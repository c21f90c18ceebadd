use crate::error::ParseSeverityError;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Cloud Logging severity, ordered from least to most severe.
///
/// Every variant has exactly one canonical uppercase name and one numeric
/// `LogSeverity` code. Decoding is lenient: an unknown name or code yields
/// [`Severity::Default`] so a malformed level never aborts a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    #[default]
    Default,
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Severity {
    /// All severities in ordinal order.
    pub const ALL: [Severity; 9] = [
        Severity::Default,
        Severity::Debug,
        Severity::Info,
        Severity::Notice,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
        Severity::Alert,
        Severity::Emergency,
    ];

    /// Canonical uppercase name, e.g. `"WARNING"`.
    pub fn name(self) -> &'static str {
        match self {
            Severity::Default => "DEFAULT",
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Notice => "NOTICE",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
            Severity::Alert => "ALERT",
            Severity::Emergency => "EMERGENCY",
        }
    }

    /// Lenient inverse of [`Severity::name`]. Matching ignores ASCII case;
    /// anything unrecognised maps to [`Severity::Default`].
    pub fn from_name(name: &str) -> Severity {
        Self::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name.trim()))
            .unwrap_or_default()
    }

    /// Position in [`Severity::ALL`], `0..=8`.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn from_ordinal(ordinal: u8) -> Severity {
        Self::ALL
            .get(usize::from(ordinal))
            .copied()
            .unwrap_or_default()
    }

    /// Numeric `google.logging.type.LogSeverity` code (`0`, `100`, .. `800`).
    pub fn code(self) -> i32 {
        i32::from(self.ordinal()) * 100
    }

    pub fn from_code(code: i32) -> Severity {
        if code % 100 != 0 || !(0..=800).contains(&code) {
            return Severity::Default;
        }
        // Range checked above, the quotient fits in a u8.
        Self::from_ordinal((code / 100) as u8)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sev| sev.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseSeverityError(s.to_string()))
    }
}

impl From<tracing::Level> for Severity {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Severity::Error,
            tracing::Level::WARN => Severity::Warning,
            tracing::Level::INFO => Severity::Info,
            _ => Severity::Debug,
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeverityVisitor;

        impl<'de> Visitor<'de> for SeverityVisitor {
            type Value = Severity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a severity name or numeric LogSeverity code")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Severity, E> {
                Ok(Severity::from_name(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Severity, E> {
                Ok(i32::try_from(v).map(Severity::from_code).unwrap_or_default())
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Severity, E> {
                Ok(i32::try_from(v).map(Severity::from_code).unwrap_or_default())
            }
        }

        deserializer.deserialize_any(SeverityVisitor)
    }
}

/// Serializes a severity as its numeric code, for the proto wire profile.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SeverityCode(pub Severity);

impl Serialize for SeverityCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32(self.0.code())
    }
}
