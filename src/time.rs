use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;

/// Rendering of an unset timestamp in the text profile: the zero `time.Time`
/// as printed by Go, which existing log queries already match on.
pub const ZERO_TIME: &str = "0001-01-01 00:00:00 +0000 UTC";

/// `2006-01-02 15:04:05.999999999 -0700 MST` layout, trailing zeros of the
/// fraction trimmed.
pub fn text_timestamp(ts: Option<DateTime<Utc>>) -> String {
    let Some(ts) = ts else {
        return ZERO_TIME.to_string();
    };

    let mut out = ts.format("%Y-%m-%d %H:%M:%S").to_string();
    let nanos = ts.timestamp_subsec_nanos();
    if nanos != 0 {
        let frac = format!("{:09}", nanos);
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out.push_str(" +0000 UTC");
    out
}

/// RFC 3339 in UTC with 0, 3, 6 or 9 fractional digits, as the protobuf
/// JSON mapping of `google.protobuf.Timestamp` requires.
pub fn proto_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Seconds with six decimals and an `s` suffix, e.g. `0.000123s`.
pub fn text_latency(latency: Duration) -> String {
    format!("{:.6}s", latency.as_secs_f64())
}

/// Protobuf JSON `google.protobuf.Duration`: whole seconds plus 0, 3, 6 or 9
/// fractional digits, e.g. `1.500s`.
pub fn proto_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let nanos = d.subsec_nanos();
    if nanos == 0 {
        format!("{}s", secs)
    } else if nanos % 1_000_000 == 0 {
        format!("{}.{:03}s", secs, nanos / 1_000_000)
    } else if nanos % 1_000 == 0 {
        format!("{}.{:06}s", secs, nanos / 1_000)
    } else {
        format!("{}.{:09}s", secs, nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unset_text_timestamp_is_go_zero_time() {
        assert_eq!(text_timestamp(None), "0001-01-01 00:00:00 +0000 UTC");
    }

    #[test]
    fn text_timestamp_trims_fraction() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(text_timestamp(Some(ts)), "2024-03-09 07:05:01.25 +0000 UTC");

        let whole = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(text_timestamp(Some(whole)), "2024-03-09 07:05:01 +0000 UTC");
    }

    #[test]
    fn proto_timestamp_is_rfc3339_zulu() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap()
            + chrono::Duration::milliseconds(250);
        assert_eq!(proto_timestamp(ts), "2024-03-09T07:05:01.250Z");
    }

    #[test]
    fn latency_encodings() {
        assert_eq!(text_latency(Duration::ZERO), "0.000000s");
        assert_eq!(text_latency(Duration::from_micros(1500)), "0.001500s");

        assert_eq!(proto_duration(Duration::from_secs(2)), "2s");
        assert_eq!(proto_duration(Duration::from_millis(1500)), "1.500s");
        assert_eq!(proto_duration(Duration::from_micros(1)), "0.000001s");
        assert_eq!(proto_duration(Duration::from_nanos(7)), "0.000000007s");
    }
}
