use crate::profile::WireProfile;
use crate::time::{proto_duration, text_latency};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Request/response metadata captured once per handled request.
///
/// This is the boundary with the HTTP middleware: it fills one snapshot per
/// call and hands it to the formatter. The snapshot is never mutated after
/// it has been built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSnapshot {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub user_agent: String,
    pub remote_ip: String,
    pub protocol: String,
    pub latency: Duration,
    /// Response body size in bytes; negative when the body was never written.
    pub body_size: i64,
    pub timestamp: Option<DateTime<Utc>>,
}

impl RequestSnapshot {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            protocol: "HTTP/1.1".to_string(),
            ..Self::default()
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn remote_ip(mut self, ip: impl Into<String>) -> Self {
        self.remote_ip = ip.into();
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn body_size(mut self, size: i64) -> Self {
        self.body_size = size;
        self
    }

    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }
}

#[cfg(feature = "http")]
impl<B> From<&http::Request<B>> for RequestSnapshot {
    /// Captures method, URI, user agent and protocol. Status, latency, size
    /// and client address are only known once the response is done and are
    /// left for the caller to set.
    fn from(req: &http::Request<B>) -> Self {
        let user_agent = req
            .headers()
            .get(http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        Self {
            method: req.method().as_str().to_string(),
            url: req.uri().to_string(),
            user_agent: user_agent.to_string(),
            protocol: format!("{:?}", req.version()),
            ..Self::default()
        }
    }
}

/// `httpRequest` group in the text profile: every field present, latency
/// and size rendered as strings.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TextHttpRequest {
    pub request_method: String,
    pub request_url: String,
    pub status: u16,
    pub user_agent: String,
    pub remote_ip: String,
    pub latency: String,
    pub protocol: String,
    pub response_size: String,
}

/// `httpRequest` group in the proto profile: zero-valued fields omitted.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProtoHttpRequest {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub request_method: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub request_url: String,
    #[serde(skip_serializing_if = "is_zero_status")]
    pub status: u16,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_agent: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remote_ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_size: Option<i64>,
}

fn is_zero_status(status: &u16) -> bool {
    *status == 0
}

impl ProtoHttpRequest {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The `httpRequest` group in whichever profile was requested.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum HttpRequest {
    Text(TextHttpRequest),
    Proto(ProtoHttpRequest),
}

impl HttpRequest {
    /// Map a snapshot onto the wire shape of `profile`.
    pub fn from_snapshot(snapshot: &RequestSnapshot, profile: WireProfile) -> Self {
        match profile {
            WireProfile::Text => HttpRequest::Text(TextHttpRequest {
                request_method: snapshot.method.clone(),
                request_url: snapshot.url.clone(),
                status: snapshot.status,
                user_agent: snapshot.user_agent.clone(),
                remote_ip: snapshot.remote_ip.clone(),
                latency: text_latency(snapshot.latency),
                protocol: snapshot.protocol.clone(),
                response_size: snapshot.body_size.to_string(),
            }),
            WireProfile::Proto => HttpRequest::Proto(ProtoHttpRequest {
                request_method: snapshot.method.clone(),
                request_url: snapshot.url.clone(),
                status: snapshot.status,
                user_agent: snapshot.user_agent.clone(),
                remote_ip: snapshot.remote_ip.clone(),
                latency: (!snapshot.latency.is_zero()).then(|| proto_duration(snapshot.latency)),
                protocol: snapshot.protocol.clone(),
                response_size: (snapshot.body_size > 0).then_some(snapshot.body_size),
            }),
        }
    }

    /// `true` when the group carries nothing and should be left out of the
    /// record. The text profile always has at least its placeholders.
    pub fn is_empty(&self) -> bool {
        match self {
            HttpRequest::Text(_) => false,
            HttpRequest::Proto(p) => p.is_empty(),
        }
    }
}
