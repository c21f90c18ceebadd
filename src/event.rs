use crate::compose::Payload;
use crate::record::LogEntry;
use crate::severity::Severity;
use chrono::Utc;
use std::error::Error;
use tracing::field::{Field, Visit};
use tracing::Event;

impl LogEntry {
    /// Build an entry from a `tracing` event: the `message` field becomes the
    /// message, every other field goes into the payload, and the level maps
    /// onto a [`Severity`]. The entry is stamped with the current time.
    pub fn from_event(event: &Event<'_>) -> Self {
        let mut fields = Payload::new();
        let mut message: Option<String> = None;

        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        LogEntry {
            message: message.unwrap_or_default(),
            severity: Severity::from(*event.metadata().level()),
            timestamp: Some(Utc::now()),
            fields,
            stack_trace: None,
            http_request: None,
        }
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut Payload,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert_value(field.name(), value.to_string());
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert_value(field.name(), value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert_value(field.name(), value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert_value(field.name(), value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert_value(field.name(), value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        self.fields.insert_value(field.name(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert_value(field.name(), format!("{:?}", value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tracing::Subscriber;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
    use tracing_subscriber::Registry;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<(String, Severity, Value)>>>);

    impl<S: Subscriber> Layer<S> for Capture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let entry = LogEntry::from_event(event);
            let payload = serde_json::to_value(&entry.fields).unwrap();
            self.0.lock().unwrap().push((entry.message, entry.severity, payload));
        }
    }

    #[test]
    fn event_fields_become_payload() {
        let capture = Capture::default();
        let subscriber = Registry::default().with(capture.clone());

        tracing::subscriber::with_default(subscriber, || {
            let err = std::io::Error::new(std::io::ErrorKind::Other, "refused");
            tracing::error!(
                user_id = 42,
                ratio = 0.5,
                retry = false,
                reason = "bad password",
                cause = &err as &(dyn std::error::Error + 'static),
                "authentication failed"
            );
            tracing::warn!("disk almost full");
        });

        let seen = capture.0.lock().unwrap();
        assert_eq!(seen.len(), 2);

        let (message, severity, payload) = &seen[0];
        assert_eq!(message, "authentication failed");
        assert_eq!(*severity, Severity::Error);
        assert_eq!(
            payload,
            &json!({
                "user_id": 42,
                "ratio": 0.5,
                "retry": false,
                "reason": "bad password",
                "cause": "refused",
            })
        );

        let (message, severity, payload) = &seen[1];
        assert_eq!(message, "disk almost full");
        assert_eq!(*severity, Severity::Warning);
        assert_eq!(payload, &json!({}));
    }
}
