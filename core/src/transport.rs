//! The network seam.
//!
//! [`Transport`] is the only thing in the crate that performs I/O. The
//! production implementation wraps a pooled [`reqwest::Client`]; tests plug in
//! recording or canned transports.

use std::error::Error as _;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::DkgError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, DEFAULT_TIMEOUT};

/// Executes one request and returns the raw response.
///
/// Implementations must return `Ok` for every HTTP response regardless of
/// status; status interpretation belongs to the pipeline. Anything that
/// prevents a response from arriving is reported as an `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, DkgError>;
}

/// [`Transport`] backed by `reqwest`.
///
/// Cloning is cheap and shares the underlying connection pool, so one
/// instance can serve any number of concurrent requests.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, DkgError> {
        Self::with_connect_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_connect_timeout(timeout: Duration) -> Result<Self, DkgError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(transport_error)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, DkgError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self
            .client
            .request(method, request.url.as_str())
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.text().await.map_err(transport_error)?;

        Ok(HttpResponse { status, headers, body })
    }
}

/// Flatten a reqwest error and its sources into one message.
fn transport_error(err: reqwest::Error) -> DkgError {
    let mut message = err.to_string();
    if err.is_timeout() && !message.contains("timed out") {
        message.push_str(": operation timed out");
    }
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    DkgError::Transport(message)
}
