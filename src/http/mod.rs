//! Outbound HTTP plumbing for metadata providers.
//!
//! Requests and responses travel as small owned envelopes ([`HttpRequest`],
//! [`HttpResponse`]) through an [`HttpTransport`]. Transports compose as
//! layers:
//!
//! - [`ReqwestTransport`] -- performs the actual network call.
//! - [`AuthTransport`] -- injects the credential header on every attempt.
//! - [`RetryTransport`] -- retries `429 Too Many Requests` with exponential
//!   backoff, abandoning the wait when the caller's token is cancelled.
//!
//! ```rust,ignore
//! let transport = RetryTransport::new(
//!     AuthTransport::new(ReqwestTransport::new(Duration::from_secs(10))?, Credential::token(pat)),
//!     RetryConfig::default(),
//! );
//! let response = transport.execute(HttpRequest::get(url), &cancel).await?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::sync::CancellationToken;

pub mod auth;
mod reqwest_backend;
pub mod retry;

pub use auth::{AuthTransport, Credential};
pub use reqwest_backend::ReqwestTransport;
pub use retry::{RetryConfig, RetryTransport};

/// HTTP status signalling client-side throttling.
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Minimal HTTP method set needed by providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// Outbound request envelope.
///
/// The body is an immutable shared buffer, so every retry attempt sends an
/// untouched clone of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Header names are stored lower-cased.
    pub headers: BTreeMap<String, String>,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Response envelope with the body fully read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lower-cased.
    pub headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Terminal transport failure.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (DNS, connect, timeout, body read).
    #[error("request failed: {0}")]
    Network(String),

    /// The caller's cancellation token fired while waiting to retry.
    #[error("request cancelled")]
    Cancelled,

    /// Every attempt was throttled.
    #[error("failed after {attempts} attempts, last status: {status}")]
    RetriesExhausted { attempts: u32, status: u16 },
}

/// Asynchronous request executor.
///
/// Implementations receive the caller's cancellation token; layers that wait
/// (such as [`RetryTransport`]) must stop waiting once it fires.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    async fn execute(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        (**self).execute(request, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_case_insensitive() {
        let request = HttpRequest::get("https://api.github.test/repos/a/b")
            .with_header("Accept", "application/json");
        assert_eq!(request.header("accept"), Some("application/json"));
        assert_eq!(request.header("ACCEPT"), Some("application/json"));

        let response = HttpResponse::new(200).with_header("X-RateLimit-Remaining", "42");
        assert_eq!(response.header("x-ratelimit-remaining"), Some("42"));
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(HttpResponse::new(200).is_success());
        assert!(HttpResponse::new(204).is_success());
        assert!(!HttpResponse::new(304).is_success());
        assert!(!HttpResponse::new(429).is_success());
    }

    #[test]
    fn body_clone_is_independent_of_consumption() {
        let request = HttpRequest::new(HttpMethod::Post, "https://x.test").with_body("payload");
        let first = request.clone();
        drop(first);
        assert_eq!(request.body.as_deref(), Some(&b"payload"[..]));
    }
}
