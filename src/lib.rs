//! Repostat - enrich stored GitHub repository references with live metadata
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod enrich;
pub mod http;
pub mod metadata;
pub mod reporter;
