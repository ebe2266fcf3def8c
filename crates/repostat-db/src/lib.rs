//! Repostat-DB: Database schema, migrations, and query operations
//!
//! This crate provides database functionality for repostat using SQLite
//! with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use repostat_db::pool::{init_pool, get_conn};
//! use repostat_db::queries::repos;
//!
//! let pool = init_pool("/var/lib/repostat/repostat.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let pending = repos::list_repos_for_enrichment(&conn, 50, false).unwrap();
//! println!("{} repos waiting for enrichment", pending.len());
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
