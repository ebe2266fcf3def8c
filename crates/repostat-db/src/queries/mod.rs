//! Database query modules.
//!
//! - repos: Extracted repository CRUD and enrichment updates

pub mod repos;
