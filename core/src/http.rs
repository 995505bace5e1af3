//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe HTTP requests and responses as plain data. The
//! `TripClient` builds `HttpRequest` values and parses `HttpResponse` values
//! without touching the network. Either the in-crate `Transport` or a mobile
//! host behind the C ABI executes the actual round-trip.
//!
//! Every request carries its own wait budget: ordinary calls get the short
//! default, AI-generation calls the long one. The executor enforces it.

use std::time::Duration;

/// Wait budget for ordinary API calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Wait budget for calls that run the generative planner.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `TripClient::build_*` methods. `path` is the absolute URL,
/// query string included.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub(crate) fn new(method: HttpMethod, path: String) -> Self {
        Self {
            method,
            path,
            headers: Vec::new(),
            body: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub(crate) fn json_body(mut self, body: String) -> Self {
        self.headers
            .push(("content-type".to_string(), "application/json".to_string()));
        self.body = Some(body);
        self
    }

    /// Attach `Authorization: Bearer <token>` when a token is supplied.
    pub(crate) fn bearer(mut self, token: Option<&str>) -> Self {
        if let Some(token) = token {
            self.headers
                .push(("authorization".to_string(), format!("Bearer {token}")));
        }
        self
    }

    pub(crate) fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
