//! Core type definitions for repository enrichment.
//!
//! Statuses are stored and serialized in their upper-case wire form
//! (`PENDING`, `SUCCESS`, `NOT_FOUND`, `API_ERROR`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Enrichment state of a stored repository.
///
/// `Pending` is the initial state. The other variants are terminal for a
/// single attempt, but a repository may be re-queued by a later batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrichmentStatus {
    /// Not yet enriched.
    #[default]
    Pending,
    /// Metadata was fetched and stored.
    Success,
    /// The provider reports the repository does not exist.
    NotFound,
    /// The fetch or the write failed.
    ApiError,
}

impl EnrichmentStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Success, Self::NotFound, Self::ApiError];

    /// Stored string form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::NotFound => "NOT_FOUND",
            Self::ApiError => "API_ERROR",
        }
    }
}

impl fmt::Display for EnrichmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrichmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "NOT_FOUND" => Ok(Self::NotFound),
            "API_ERROR" => Ok(Self::ApiError),
            _ => Err(format!("Invalid enrichment status: {}", s)),
        }
    }
}

/// Metadata fetched for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoStats {
    /// Stargazer count.
    pub stars: i64,
    /// Fork count.
    pub forks: i64,
    /// Time of the most recent push.
    pub last_pushed: DateTime<Utc>,
    /// Repository description (empty when unset).
    pub description: String,
    /// Primary language (empty when unset).
    pub language: String,
}
