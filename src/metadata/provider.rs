//! Trait definition and types for repository metadata providers.

use async_trait::async_trait;
use repostat_common::{RepoId, RepoStats};
use tokio_util::sync::CancellationToken;

use crate::http::TransportError;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a metadata lookup failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The provider says the repository does not exist.
    #[error("repository not found")]
    NotFound,

    /// The account's request quota is used up. Halts the whole batch.
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Any other non-2xx status.
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),

    /// A 2xx body that could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl FetchError {
    pub const fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimitExceeded)
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// The lookup was abandoned because its batch was cancelled.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Cancelled))
    }
}

// ---------------------------------------------------------------------------
// Lookup result
// ---------------------------------------------------------------------------

/// Outcome of one lookup, together with the quota the provider reported.
#[derive(Debug)]
pub struct StatsLookup {
    pub stats: Result<RepoStats, FetchError>,
    /// Requests left in the current window; `0` when the provider did not say.
    pub rate_limit_remaining: u32,
}

impl StatsLookup {
    pub fn new(stats: Result<RepoStats, FetchError>, rate_limit_remaining: u32) -> Self {
        Self {
            stats,
            rate_limit_remaining,
        }
    }

    /// A failure that never reached the provider.
    pub fn failed(error: FetchError) -> Self {
        Self::new(Err(error), 0)
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Async trait implemented by every repository metadata source.
///
/// Providers are shared across workers behind an `Arc`, so implementations
/// must be `Send + Sync` and hold no per-call state.
#[async_trait]
pub trait RepoStatsProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"github"`).
    fn name(&self) -> &'static str;

    /// Fetch current metadata for `repo`.
    ///
    /// `cancel` is handed down to the transport so backoff waits stop once the
    /// batch is cancelled.
    async fn repo_stats(&self, repo: &RepoId, cancel: &CancellationToken) -> StatsLookup;
}
