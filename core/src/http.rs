//! HTTP transport types for the host-does-IO split.
//!
//! # Design
//! Requests and responses are plain data. `DkgClient` produces `HttpRequest`
//! values and the pipeline consumes `HttpResponse` values; only a `Transport`
//! touches the network. A request is built fresh per call, never mutated
//! afterwards, and consumed by exactly one dispatch.

use std::time::Duration;

/// Timeout applied to every request unless the client is configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Media types used by the node API.
pub mod media_type {
    pub const APPLICATION_JSON: &str = "application/json; charset=utf-8";
    pub const APPLICATION_JSON_LD: &str = "application/ld+json; charset=utf-8";
    pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
}

pub const CONTENT_TYPE: &str = "Content-Type";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute. `body` holds raw bytes because multipart bodies carry
/// file content verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `METHOD url`, as it would appear in logs.
    pub fn request_line(&self) -> String {
        format!("{} {}", self.method.as_str(), self.url)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}
