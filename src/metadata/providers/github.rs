//! GitHub REST metadata provider.
//!
//! Implements [`RepoStatsProvider`] by querying `GET /repos/{owner}/{name}`.
//!
//! Features:
//! - Credential injection and 429 backoff via the [`crate::http`] layers.
//! - 404 maps to [`FetchError::NotFound`].
//! - 403 with an exhausted quota maps to [`FetchError::RateLimitExceeded`].
//! - The `X-RateLimit-Remaining` header is reported with every outcome.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use repostat_common::{RepoId, RepoStats};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::GithubConfig;
use crate::http::{
    AuthTransport, Credential, HttpRequest, HttpTransport, ReqwestTransport, RetryConfig,
    RetryTransport, TransportError,
};
use crate::metadata::provider::{FetchError, RepoStatsProvider, StatsLookup};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const GITHUB_API_URL: &str = "https://api.github.com";
const ACCEPT_V3: &str = "application/vnd.github.v3+json";
const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";

const STATUS_FORBIDDEN: u16 = 403;
const STATUS_NOT_FOUND: u16 = 404;

/// Production transport stack: retry outside, auth inside, reqwest at the bottom.
pub type GithubTransport = RetryTransport<AuthTransport<ReqwestTransport>>;

// ---------------------------------------------------------------------------
// API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GithubRepoResponse {
    stargazers_count: i64,
    forks_count: i64,
    pushed_at: Option<DateTime<Utc>>,
    description: Option<String>,
    language: Option<String>,
}

impl From<GithubRepoResponse> for RepoStats {
    fn from(resp: GithubRepoResponse) -> Self {
        Self {
            stars: resp.stargazers_count,
            forks: resp.forks_count,
            last_pushed: resp.pushed_at.unwrap_or_default(),
            description: resp.description.unwrap_or_default(),
            language: resp.language.unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Provider
// ---------------------------------------------------------------------------

/// GitHub repository metadata client.
///
/// # Examples
///
/// ```no_run
/// use repostat::config::GithubConfig;
/// use repostat::metadata::providers::GithubProvider;
///
/// let provider = GithubProvider::from_config(&GithubConfig::default(), "ghp_token")?;
/// # Ok::<(), repostat::http::TransportError>(())
/// ```
pub struct GithubProvider<T = GithubTransport> {
    transport: T,
    base_url: String,
    halt_on_throttle_exhaustion: bool,
}

impl GithubProvider<GithubTransport> {
    /// Build the production transport stack from configuration.
    ///
    /// An empty `token` sends unauthenticated requests.
    pub fn from_config(config: &GithubConfig, token: &str) -> Result<Self, TransportError> {
        let network = ReqwestTransport::new(Duration::from_secs(config.timeout_secs))?;
        let transport = RetryTransport::new(
            AuthTransport::new(network, Credential::token(token)),
            RetryConfig::new(
                config.max_attempts,
                Duration::from_millis(config.initial_backoff_ms),
            ),
        );

        Ok(Self::new(transport)
            .with_base_url(&config.base_url)
            .halt_on_throttle_exhaustion(config.halt_on_throttle_exhaustion))
    }
}

impl<T: HttpTransport> GithubProvider<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            base_url: GITHUB_API_URL.to_string(),
            halt_on_throttle_exhaustion: false,
        }
    }

    /// Point the client at another API root (GitHub Enterprise, mock servers).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Treat exhausted 429 retries as a batch-halting rate limit.
    pub fn halt_on_throttle_exhaustion(mut self, enabled: bool) -> Self {
        self.halt_on_throttle_exhaustion = enabled;
        self
    }

    fn repo_url(&self, repo: &RepoId) -> String {
        format!("{}/repos/{}/{}", self.base_url, repo.owner(), repo.name())
    }

    fn classify_transport(&self, err: TransportError) -> FetchError {
        match err {
            TransportError::RetriesExhausted { .. } if self.halt_on_throttle_exhaustion => {
                FetchError::RateLimitExceeded
            }
            other => FetchError::Transport(other),
        }
    }

    /// Fetch metadata for one repository.
    pub async fn fetch(&self, repo: &RepoId, cancel: &CancellationToken) -> StatsLookup {
        let request = HttpRequest::get(self.repo_url(repo)).with_header("accept", ACCEPT_V3);

        let response = match self.transport.execute(request, cancel).await {
            Ok(response) => response,
            Err(err) => return StatsLookup::failed(self.classify_transport(err)),
        };

        let remaining = response
            .header(RATE_LIMIT_REMAINING)
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(0);

        debug!(
            repo_id = %repo,
            status = response.status,
            rate_limit_remaining = remaining,
            "GitHub response"
        );

        let stats = match response.status {
            STATUS_NOT_FOUND => Err(FetchError::NotFound),
            STATUS_FORBIDDEN if remaining == 0 => Err(FetchError::RateLimitExceeded),
            _ if !response.is_success() => Err(FetchError::UnexpectedStatus(response.status)),
            _ => serde_json::from_slice::<GithubRepoResponse>(&response.body)
                .map(RepoStats::from)
                .map_err(|e| FetchError::Decode(e.to_string())),
        };

        StatsLookup::new(stats, remaining)
    }
}

#[async_trait]
impl<T: HttpTransport> RepoStatsProvider for GithubProvider<T> {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn repo_stats(&self, repo: &RepoId, cancel: &CancellationToken) -> StatsLookup {
        self.fetch(repo, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn repo() -> RepoId {
        "tokio-rs/tokio".parse().unwrap()
    }

    fn config(server: &MockServer) -> GithubConfig {
        GithubConfig {
            base_url: server.uri(),
            timeout_secs: 5,
            max_attempts: 3,
            initial_backoff_ms: 1,
            ..GithubConfig::default()
        }
    }

    fn repo_body() -> serde_json::Value {
        json!({
            "full_name": "tokio-rs/tokio",
            "stargazers_count": 26000,
            "forks_count": 2400,
            "pushed_at": "2024-05-01T12:00:00Z",
            "description": "A runtime for writing reliable asynchronous applications",
            "language": "Rust"
        })
    }

    #[tokio::test]
    async fn fetch_decodes_stats_and_quota() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/tokio-rs/tokio"))
            .and(header("accept", ACCEPT_V3))
            .and(header("authorization", "token ghp_test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-RateLimit-Remaining", "4999")
                    .set_body_json(repo_body()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider = GithubProvider::from_config(&config(&server), "ghp_test").unwrap();
        let lookup = provider.fetch(&repo(), &CancellationToken::new()).await;

        assert_eq!(lookup.rate_limit_remaining, 4999);
        let stats = lookup.stats.unwrap();
        assert_eq!(stats.stars, 26000);
        assert_eq!(stats.forks, 2400);
        assert_eq!(
            stats.last_pushed,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(stats.language, "Rust");
    }

    #[tokio::test]
    async fn null_description_and_language_become_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stargazers_count": 1,
                "forks_count": 0,
                "pushed_at": "2023-01-01T00:00:00Z",
                "description": null,
                "language": null
            })))
            .mount(&server)
            .await;

        let provider = GithubProvider::from_config(&config(&server), "").unwrap();
        let stats = provider
            .fetch(&repo(), &CancellationToken::new())
            .await
            .stats
            .unwrap();

        assert_eq!(stats.description, "");
        assert_eq!(stats.language, "");
    }

    #[tokio::test]
    async fn not_found_keeps_quota() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).insert_header("X-RateLimit-Remaining", "12"))
            .mount(&server)
            .await;

        let provider = GithubProvider::from_config(&config(&server), "").unwrap();
        let lookup = provider.fetch(&repo(), &CancellationToken::new()).await;

        assert_matches!(lookup.stats, Err(FetchError::NotFound));
        assert_eq!(lookup.rate_limit_remaining, 12);
    }

    #[tokio::test]
    async fn forbidden_with_zero_quota_is_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).insert_header("X-RateLimit-Remaining", "0"))
            .mount(&server)
            .await;

        let provider = GithubProvider::from_config(&config(&server), "").unwrap();
        let lookup = provider.fetch(&repo(), &CancellationToken::new()).await;

        assert_matches!(lookup.stats, Err(FetchError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn forbidden_with_quota_left_is_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).insert_header("X-RateLimit-Remaining", "30"))
            .mount(&server)
            .await;

        let provider = GithubProvider::from_config(&config(&server), "").unwrap();
        let lookup = provider.fetch(&repo(), &CancellationToken::new()).await;

        assert_matches!(lookup.stats, Err(FetchError::UnexpectedStatus(403)));
        assert_eq!(lookup.rate_limit_remaining, 30);
    }

    #[tokio::test]
    async fn server_error_is_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let provider = GithubProvider::from_config(&config(&server), "").unwrap();
        let lookup = provider.fetch(&repo(), &CancellationToken::new()).await;

        assert_matches!(lookup.stats, Err(FetchError::UnexpectedStatus(502)));
        assert_eq!(lookup.rate_limit_remaining, 0);
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let provider = GithubProvider::from_config(&config(&server), "").unwrap();
        let lookup = provider.fetch(&repo(), &CancellationToken::new()).await;

        assert_matches!(lookup.stats, Err(FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn throttle_exhaustion_is_generic_by_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let provider = GithubProvider::from_config(&config(&server), "").unwrap();
        let lookup = provider.fetch(&repo(), &CancellationToken::new()).await;

        assert_matches!(
            lookup.stats,
            Err(FetchError::Transport(TransportError::RetriesExhausted {
                attempts: 3,
                status: 429
            }))
        );
    }

    #[tokio::test]
    async fn throttle_exhaustion_halts_when_enabled() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let mut cfg = config(&server);
        cfg.halt_on_throttle_exhaustion = true;
        let provider = GithubProvider::from_config(&cfg, "").unwrap();
        let lookup = provider.fetch(&repo(), &CancellationToken::new()).await;

        assert_matches!(lookup.stats, Err(FetchError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn auth_header_is_sent_on_every_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "token ghp_retry"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("authorization", "token ghp_retry"))
            .respond_with(ResponseTemplate::new(200).set_body_json(repo_body()))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GithubProvider::from_config(&config(&server), "ghp_retry").unwrap();
        let lookup = provider.fetch(&repo(), &CancellationToken::new()).await;

        assert!(lookup.stats.is_ok());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        struct Never;

        #[async_trait]
        impl HttpTransport for Never {
            async fn execute(
                &self,
                _request: HttpRequest,
                _cancel: &CancellationToken,
            ) -> Result<crate::http::HttpResponse, TransportError> {
                Err(TransportError::Network("unused".into()))
            }
        }

        let provider = GithubProvider::new(Never).with_base_url("http://ghe.local/api/v3/");
        assert_eq!(
            provider.repo_url(&repo()),
            "http://ghe.local/api/v3/repos/tokio-rs/tokio"
        );
    }
}
