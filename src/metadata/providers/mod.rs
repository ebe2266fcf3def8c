//! Concrete metadata provider implementations.
//!
//! Each submodule wraps a single external API and implements the
//! [`RepoStatsProvider`](super::RepoStatsProvider) trait.

pub mod github;

pub use github::{GithubProvider, GithubTransport, GITHUB_API_URL};
