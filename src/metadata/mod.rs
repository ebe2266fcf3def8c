//! Metadata provider system for enriching stored repositories with live data.
//!
//! # Module layout
//!
//! - [`provider`] -- Trait definition, lookup result and error taxonomy.
//! - [`providers`] -- Concrete provider implementations (GitHub).

pub mod provider;
pub mod providers;

pub use provider::{FetchError, RepoStatsProvider, StatsLookup};
pub use providers::GithubProvider;
