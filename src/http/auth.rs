//! Credential injection layer.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Static credential attached to every outbound request.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    None,
    /// GitHub personal access token, sent as `Authorization: token <T>`.
    Token(String),
}

impl Credential {
    /// GitHub-style token credential; an empty token means no credential.
    pub fn token(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.is_empty() {
            Self::None
        } else {
            Self::Token(token)
        }
    }

    fn header_value(&self) -> Option<String> {
        match self {
            Self::None => None,
            Self::Token(token) => Some(format!("token {token}")),
        }
    }
}

// Never print the secret.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Token(_) => f.write_str("Token(***)"),
        }
    }
}

/// Sets the `authorization` header before delegating to the inner transport.
#[derive(Debug)]
pub struct AuthTransport<T> {
    inner: T,
    credential: Credential,
}

impl<T> AuthTransport<T> {
    pub fn new(inner: T, credential: Credential) -> Self {
        Self { inner, credential }
    }
}

#[async_trait]
impl<T: HttpTransport> HttpTransport for AuthTransport<T> {
    async fn execute(
        &self,
        request: HttpRequest,
        cancel: &CancellationToken,
    ) -> Result<HttpResponse, TransportError> {
        let request = match self.credential.header_value() {
            Some(value) => request.with_header("authorization", value),
            None => request,
        };
        self.inner.execute(request, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Capture {
        seen: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl HttpTransport for Capture {
        async fn execute(
            &self,
            request: HttpRequest,
            _cancel: &CancellationToken,
        ) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            Ok(HttpResponse::new(200))
        }
    }

    #[tokio::test]
    async fn token_credential_sets_github_authorization() {
        let transport = AuthTransport::new(Capture::default(), Credential::token("ghp_abc"));
        transport
            .execute(HttpRequest::get("https://api.github.test"), &CancellationToken::new())
            .await
            .unwrap();

        let seen = transport.inner.seen.lock().unwrap();
        assert_eq!(seen[0].header("authorization"), Some("token ghp_abc"));
    }

    #[tokio::test]
    async fn token_credential_overrides_existing_header() {
        let transport = AuthTransport::new(Capture::default(), Credential::token("k"));
        let request =
            HttpRequest::get("https://x.test").with_header("Authorization", "Basic stale");
        transport
            .execute(request, &CancellationToken::new())
            .await
            .unwrap();

        let seen = transport.inner.seen.lock().unwrap();
        assert_eq!(seen[0].header("authorization"), Some("token k"));
    }

    #[tokio::test]
    async fn empty_token_sends_no_header() {
        assert_eq!(Credential::token(""), Credential::None);

        let transport = AuthTransport::new(Capture::default(), Credential::token(""));
        transport
            .execute(HttpRequest::get("https://x.test"), &CancellationToken::new())
            .await
            .unwrap();

        let seen = transport.inner.seen.lock().unwrap();
        assert_eq!(seen[0].header("authorization"), None);
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", Credential::token("ghp_secret"));
        assert!(!rendered.contains("ghp_secret"));
    }
}
