//! Repostat-Common: Shared types, identifiers, and errors.
//!
//! This crate provides common functionality used across repostat:
//!
//! - **Repository IDs**: Validated `owner/name` identifiers
//! - **Core Types**: Enrichment status and the fetched metadata snapshot
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use repostat_common::{EnrichmentStatus, Error, RepoId, Result};
//!
//! // Parse a repository identifier
//! let id: RepoId = "rust-lang/cargo".parse().unwrap();
//! assert_eq!(id.owner(), "rust-lang");
//!
//! // Statuses round-trip through their stored form
//! assert_eq!("NOT_FOUND".parse::<EnrichmentStatus>().unwrap(), EnrichmentStatus::NotFound);
//!
//! // Use common error types
//! fn example() -> Result<()> {
//!     Err(Error::not_found("repo"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
