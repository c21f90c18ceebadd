use std::time::{Duration, Instant};

use chrono::Utc;
use stackdriver_log_formatter::{RequestLogFormatter, RequestSnapshot, Severity};

fn main() {
    // Customize the severity here; it defaults to INFO.
    let formatter = RequestLogFormatter::with_severity(Severity::Debug).into_fn();

    let req = http::Request::builder()
        .method("GET")
        .uri("http://localhost:8080/ping")
        .header(http::header::USER_AGENT, "curl/8.4.0")
        .body(())
        .expect("valid request");

    let started = Instant::now();
    let snapshot = RequestSnapshot::from(&req)
        .status(200)
        .remote_ip("127.0.0.1")
        .body_size(17)
        .latency(started.elapsed() + Duration::from_micros(350))
        .timestamp(Utc::now());

    print!("{}", formatter(&snapshot));
}
