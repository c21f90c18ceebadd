//! Environment variable names used by this crate for convenient
//! configuration of formatters from microservices.
//!
//! These are purely helpers; the formatter types remain decoupled from
//! environment access and can be built from explicit configs.

/// Service name reported in `serviceContext.service`.
pub const LOG_FORMAT_SERVICE_ENV: &str = "LOG_FORMAT_SERVICE";

/// Service version reported in `serviceContext.version`.
pub const LOG_FORMAT_VERSION_ENV: &str = "LOG_FORMAT_VERSION";

/// Severity recorded on request log lines, e.g. `WARNING`.
pub const LOG_FORMAT_SEVERITY_ENV: &str = "LOG_FORMAT_SEVERITY";

/// Wire profile, `text` or `proto`.
pub const LOG_FORMAT_PROFILE_ENV: &str = "LOG_FORMAT_PROFILE";

/// Payload layout of error reports, `nested` or `flat`.
pub const LOG_FORMAT_PAYLOAD_ENV: &str = "LOG_FORMAT_PAYLOAD";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    env_var(key).unwrap_or_else(|| default.to_string())
}

/// Read an environment variable, treating unset and blank the same.
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
