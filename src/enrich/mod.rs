//! Concurrent enrichment of stored repositories.
//!
//! - [`store`] -- Persistence contract and its SQLite implementation.
//! - [`enricher`] -- Worker-pool orchestrator with fail-fast cancellation.
//! - [`summary`] -- Per-batch tallies.

pub mod enricher;
pub mod store;
pub mod summary;

pub use enricher::{BatchOptions, EnrichError, Enricher};
pub use store::{RepoStore, SqliteRepoStore};
pub use summary::BatchSummary;
