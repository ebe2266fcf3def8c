use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use super::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

const USER_AGENT: &str = concat!("repostat/", env!("CARGO_PKG_VERSION"));

/// Network transport backed by a shared `reqwest::Client`.
///
/// An in-flight call is not interrupted by cancellation; only waits in outer
/// layers are.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        _cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Network(format!("timeout: {e}"))
            } else if e.is_connect() {
                TransportError::Network(format!("connection failed: {e}"))
            } else {
                TransportError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let mut envelope = HttpResponse::new(status);
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                envelope = envelope.with_header(name.as_str(), value);
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Network(format!("failed to read response body: {e}")))?;

        Ok(envelope.with_body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_headers_and_reads_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("accept", "text/plain"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-RateLimit-Remaining", "4999")
                    .set_body_string("pong"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport
            .execute(
                HttpRequest::get(format!("{}/ping", server.uri())).with_header("Accept", "text/plain"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.header("x-ratelimit-remaining"), Some("4999"));
        assert_eq!(&response.body[..], b"pong");
    }

    #[tokio::test]
    async fn error_statuses_are_responses_not_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new(Duration::from_secs(5)).unwrap();
        let response = transport
            .execute(HttpRequest::get(server.uri()), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.status, 429);
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        let transport = ReqwestTransport::new(Duration::from_secs(2)).unwrap();
        let err = transport
            .execute(HttpRequest::get("http://127.0.0.1:1/"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TransportError::Network(_)));
    }
}
