use std::io::Write;

use stackdriver_log_formatter::{ErrorReportingFormatter, LogEntry, Severity, TracedError};
use tracing::{error, info, Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// Prints every event as an Error Reporting record on stdout.
struct StdoutReporter {
    formatter: ErrorReportingFormatter,
}

impl<S: Subscriber> Layer<S> for StdoutReporter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let entry = LogEntry::from_event(event);
        match self.formatter.format(&entry, None) {
            Ok(line) => {
                if let Err(e) = std::io::stdout().write_all(&line) {
                    eprintln!("failed to write log entry: {}", e);
                }
            }
            Err(e) => eprintln!("failed to format log entry: {}", e),
        }
    }
}

#[inline(never)]
fn load_profile(user_id: u64) -> Result<(), TracedError> {
    let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
    Err(TracedError::wrap(io, format!("load profile {user_id}")))
}

fn main() {
    let formatter = ErrorReportingFormatter::new("auth-service", "1.4.2");
    let subscriber = Registry::default().with(StdoutReporter {
        formatter: formatter.clone(),
    });
    tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");

    info!("starting service");

    if let Err(err) = load_profile(42) {
        error!(user_id = 42, error = %err, "authentication failed");

        // Entries built by hand can carry the rendered stack for Error Reporting.
        let entry = LogEntry::new(Severity::Error, "authentication failed")
            .field("user_id", 42)
            .with_stack_of(&err)
            .error_field("error", err);
        print!("{}", String::from_utf8_lossy(&formatter.format(&entry, None).expect("encodable entry")));
    }
}
