//! Stackdriver-compatible log formatting.
//!
//! Two formatters share one compositor:
//!
//! - [`RequestLogFormatter`] turns a per-request [`RequestSnapshot`] into an
//!   access-log line with an `httpRequest` group.
//! - [`ErrorReportingFormatter`] turns a [`LogEntry`] into a record Error
//!   Reporting understands, tagged with a fixed service and version.
//!
//! [`format_stack`] renders the innermost stack of an error chain as a
//! Go-style dump, which is the shape Error Reporting parses out of
//! `stack_trace`.

pub mod compose;
pub mod env;
pub mod error;
pub mod error_report;
pub mod event;
pub mod http_request;
pub mod profile;
pub mod record;
pub mod request_log;
pub mod severity;
pub mod stack;
pub mod time;
pub mod traced;

pub use compose::{compose, Composer, FieldValue, Payload, ToJson};
pub use error::{ConfigError, FormatError, ParseSeverityError};
pub use error_report::{ErrorReportingConfig, ErrorReportingFormatter, ServiceContext};
pub use http_request::{HttpRequest, RequestSnapshot};
pub use profile::{PayloadLayout, WireProfile};
pub use record::LogEntry;
pub use request_log::{RequestLogConfig, RequestLogFormatter};
pub use severity::Severity;
pub use stack::{
    find_traceable, format_error_stack, format_stack, BacktraceResolver, Frame, HasCause,
    HasStackTrace, StackFormatter, StackFrame, StackTrace, SymbolResolver, Traceable,
};
pub use traced::TracedError;
