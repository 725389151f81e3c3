//! Core data model: spec.md §3.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Opaque unique request identifier.
pub type RequestId = uuid::Uuid;

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

/// A tagged-variant value, used for component parameters and script
/// config bags (spec.md §9 "Dynamic configuration bags").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Number(f64),
    Bool(bool),
    List(Vec<ParamValue>),
    Map(BTreeMap<String, ParamValue>),
}

impl ParamValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

/// An ordered map of named parameters handed to a component on dispatch.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// A normalized, in-memory HTTP request (spec.md §3).
///
/// Invariant: `url` is always absolute, even when the wire request used
/// an origin-form target — the proxy synthesizes scheme and authority
/// from the CONNECT context or the `Host` header before constructing one
/// of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpRequest {
    pub id: RequestId,
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timestamp_ms: u128,
    pub client_addr: Option<String>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
            timestamp_ms: now_millis(),
            client_addr: None,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        if let Some(existing) = self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            existing.1 = value.into();
        } else {
            self.headers.push((name.to_owned(), value.into()));
        }
    }

    pub fn remove_header(&mut self, name: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    pub fn host(&self) -> Option<String> {
        let uri: rama_http_types::Uri = self.url.parse().ok()?;
        uri.host().map(str::to_owned)
    }

    pub fn path(&self) -> String {
        self.url
            .parse::<rama_http_types::Uri>()
            .map(|u| u.path().to_owned())
            .unwrap_or_else(|_| "/".to_owned())
    }
}

/// A normalized, in-memory HTTP response (spec.md §3).
///
/// `body` is populated only for textual responses (see the binary-safety
/// rule in spec.md §4.2); non-textual responses leave it `None` and are
/// forwarded byte-for-byte from the raw upstream buffer, which never
/// enters this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            reason: default_reason_phrase(status).to_owned(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, content_type: &str, body: impl Into<String>) -> Self {
        self.set_header("Content-Type", content_type);
        self.body = Some(body.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        if let Some(existing) = self
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
        {
            existing.1 = value.into();
        } else {
            self.headers.push((name.to_owned(), value.into()));
        }
    }
}

fn default_reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        418 => "I'm a teapot",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        _ => "",
    }
}

/// A completed or in-flight record kept by the Recorder (spec.md §4.6).
///
/// Lifecycle: created when the request line is parsed, updated once with
/// the flow decision, updated again with the response, then immutable
/// until eviction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: RequestId,
    pub request: HttpRequest,
    pub response: Option<HttpResponse>,
    pub duration_ms: Option<u64>,
    pub matched_flow_id: Option<u64>,
}

impl RequestRecord {
    pub fn new(request: HttpRequest) -> Self {
        Self {
            id: request.id,
            request,
            response: None,
            duration_ms: None,
            matched_flow_id: None,
        }
    }
}
