//! Executing `HttpRequest`s over the network.
//!
//! # Design
//! `Transport` is the seam between the sans-IO client and real I/O: the
//! production implementation wraps a `reqwest::Client`, tests substitute
//! scripted fakes. Wait budgets are not enforced here but in
//! `fetch_with_timeout`, so every transport gets the same timeout semantics.
//! HTTP status codes are returned as data, never as errors.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Something that can perform one HTTP round-trip.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).send(request).await
    }
}

/// Run `request` through `transport`, giving up after `request.timeout`.
///
/// On expiry the in-flight future is dropped, which aborts the underlying
/// connection, and the call fails with `ApiError::Timeout`. The timer lives
/// inside the timeout future and is gone once this returns. No retry.
pub async fn fetch_with_timeout<T>(
    transport: &T,
    request: HttpRequest,
) -> Result<HttpResponse, ApiError>
where
    T: Transport + ?Sized,
{
    let budget = request.timeout;
    let method = request.method.as_str();
    let path = request.path.clone();
    let started = Instant::now();

    match tokio::time::timeout(budget, transport.send(request)).await {
        Ok(Ok(response)) => {
            debug!(method, %path, status = response.status, elapsed = ?started.elapsed(), "request completed");
            Ok(response)
        }
        Ok(Err(err)) => {
            warn!(method, %path, error = %err, "request failed");
            Err(err)
        }
        Err(_) => {
            warn!(method, %path, timeout = ?budget, "request timed out, aborted");
            Err(ApiError::Timeout { after: budget })
        }
    }
}

/// `Transport` backed by a shared `reqwest::Client` (rustls).
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
        };

        let mut builder = self.client.request(method, &request.path);
        for (key, value) in &request.headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
