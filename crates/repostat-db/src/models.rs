//! Rust models matching the database schema.

use chrono::{DateTime, Utc};
use repostat_common::{EnrichmentStatus, RepoStats};
use serde::{Deserialize, Serialize};

/// A GitHub repository found in a bookmark, with any metadata fetched so far.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedRepo {
    /// Canonical `owner/name`, primary key. Kept raw; see [`repostat_common::RepoId`].
    pub repo_id: String,
    pub url: String,
    pub source_id: Option<String>,
    pub title: Option<String>,
    pub found_at: DateTime<Utc>,
    pub stars: Option<i64>,
    pub forks: Option<i64>,
    pub last_pushed_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub enrichment_status: EnrichmentStatus,
}

impl ExtractedRepo {
    /// Create a pending repository discovered now.
    pub fn new(repo_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            url: url.into(),
            source_id: None,
            title: None,
            found_at: Utc::now(),
            stars: None,
            forks: None,
            last_pushed_at: None,
            description: None,
            language: None,
            enrichment_status: EnrichmentStatus::Pending,
        }
    }
}

/// Write command produced by one enrichment attempt.
///
/// `stats` is only present on success; otherwise only the status changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoEnrichmentUpdate {
    pub repo_id: String,
    pub stats: Option<RepoStats>,
    pub status: EnrichmentStatus,
}

impl RepoEnrichmentUpdate {
    /// A successful fetch carrying fresh metadata.
    pub fn success(repo_id: impl Into<String>, stats: RepoStats) -> Self {
        Self {
            repo_id: repo_id.into(),
            stats: Some(stats),
            status: EnrichmentStatus::Success,
        }
    }

    /// A status-only transition.
    pub fn status(repo_id: impl Into<String>, status: EnrichmentStatus) -> Self {
        Self {
            repo_id: repo_id.into(),
            stats: None,
            status,
        }
    }
}
