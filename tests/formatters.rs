use serde_json::{json, Value};
use stackdriver_log_formatter::{
    ErrorReportingFormatter, LogEntry, RequestLogConfig, RequestLogFormatter, RequestSnapshot,
    Severity, TracedError, WireProfile,
};

fn parse_line(line: &[u8]) -> Value {
    assert_eq!(line.last(), Some(&b'\n'));
    serde_json::from_slice(line).unwrap()
}

fn test_request() -> RequestSnapshot {
    let req = http::Request::builder()
        .method("GET")
        .uri("http://test.url/")
        .body(())
        .unwrap();
    RequestSnapshot::from(&req)
}

#[test]
fn request_log_propagates_protocol_and_default_severity() {
    let formatter = RequestLogFormatter::new();
    let value = parse_line(formatter.format(&test_request()).as_bytes());

    assert_eq!(value["httpRequest"]["protocol"], json!("HTTP/1.1"));
    assert_eq!(value["httpRequest"]["requestMethod"], json!("GET"));
    assert_eq!(value["httpRequest"]["requestUrl"], json!("http://test.url/"));
    assert_eq!(value["httpRequest"]["status"], json!(0));
    assert_eq!(value["severity"], json!(formatter.config().severity.name()));
    assert_eq!(value["severity"], json!("INFO"));
}

#[test]
fn warning_option_in_both_profiles() {
    let text = RequestLogFormatter::with_severity(Severity::Warning).into_fn();
    let proto = RequestLogFormatter::with_config(RequestLogConfig {
        severity: Severity::Warning,
        profile: WireProfile::Proto,
    })
    .into_fn();

    for _ in 0..3 {
        assert!(text(&test_request()).contains(r#""severity":"WARNING""#));
        assert!(proto(&test_request()).contains(r#""severity":400"#));
    }
}

#[test]
fn error_report_carries_service_context_and_error_strings() {
    let formatter = ErrorReportingFormatter::new("S", "V");
    let failure = TracedError::wrap(TracedError::new("connection reset"), "fetch profile");

    let entry = LogEntry::new(Severity::Error, "request failed")
        .field("user", json!({"id": 7}))
        .error_field("error", failure)
        .with_http_request(test_request().status(502));

    let value = parse_line(&formatter.format(&entry, None).unwrap());
    assert_eq!(value["serviceContext"], json!({"service": "S", "version": "V"}));
    assert_eq!(value["severity"], json!(500));
    assert_eq!(value["message"], json!("request failed"));
    assert_eq!(value["payload"]["error"], json!("fetch profile: connection reset"));
    assert_eq!(value["payload"]["user"], json!({"id": 7}));
    assert_eq!(value["httpRequest"]["status"], json!(502));
}

#[test]
fn error_report_with_rendered_stack() {
    let failure = TracedError::new("boom");
    let entry = LogEntry::new(Severity::Error, "panic in handler").with_stack_of(&failure);

    let value = parse_line(&ErrorReportingFormatter::new("S", "V").format(&entry, None).unwrap());
    let stack = value["stack_trace"].as_str().unwrap();
    assert!(stack.starts_with("goroutine "), "{stack}");
    assert!(stack.contains("()\n\t"), "{stack}");
}
