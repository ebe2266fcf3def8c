//! Persistence contract used by the enricher, and its SQLite implementation.

use async_trait::async_trait;
use repostat_common::{Error, Result};
use repostat_db::models::{ExtractedRepo, RepoEnrichmentUpdate};
use repostat_db::pool::{get_conn, DbPool};
use repostat_db::queries::repos;

/// Where enrichment work comes from and where results go.
///
/// Updates for distinct repositories may arrive concurrently.
#[async_trait]
pub trait RepoStore: Send + Sync {
    /// Up to `limit` repositories; all of them with `force`, otherwise only
    /// those not yet enriched successfully.
    async fn repos_for_enrichment(&self, limit: usize, force: bool) -> Result<Vec<ExtractedRepo>>;

    /// Persist the outcome of one attempt.
    async fn update_repo_enrichment(&self, update: RepoEnrichmentUpdate) -> Result<()>;
}

/// [`RepoStore`] over the r2d2 SQLite pool.
///
/// Queries are blocking, so each one runs on the blocking thread pool.
#[derive(Clone)]
pub struct SqliteRepoStore {
    pool: DbPool,
}

impl SqliteRepoStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            f(&*conn)
        })
        .await
        .map_err(|e| Error::internal(format!("database task failed: {e}")))?
    }
}

#[async_trait]
impl RepoStore for SqliteRepoStore {
    async fn repos_for_enrichment(&self, limit: usize, force: bool) -> Result<Vec<ExtractedRepo>> {
        self.with_conn(move |conn| repos::list_repos_for_enrichment(conn, limit, force))
            .await
    }

    async fn update_repo_enrichment(&self, update: RepoEnrichmentUpdate) -> Result<()> {
        self.with_conn(move |conn| repos::update_repo_enrichment(conn, &update))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use repostat_common::{EnrichmentStatus, RepoStats};
    use repostat_db::pool::init_pool;
    use tempfile::TempDir;

    fn store() -> (TempDir, SqliteRepoStore) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let pool = init_pool(path.to_str().unwrap()).unwrap();
        {
            let conn = get_conn(&pool).unwrap();
            for id in ["a/one", "a/two"] {
                repos::insert_repo(&conn, &ExtractedRepo::new(id, format!("https://github.com/{id}")))
                    .unwrap();
            }
        }
        (dir, SqliteRepoStore::new(pool))
    }

    #[tokio::test]
    async fn test_round_trip_through_blocking_pool() {
        let (_dir, store) = store();

        let pending = store.repos_for_enrichment(10, false).await.unwrap();
        assert_eq!(pending.len(), 2);

        let stats = RepoStats {
            stars: 5,
            forks: 1,
            last_pushed: Utc::now(),
            description: String::new(),
            language: "Go".into(),
        };
        store
            .update_repo_enrichment(RepoEnrichmentUpdate::success("a/one", stats))
            .await
            .unwrap();

        let pending = store.repos_for_enrichment(10, false).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].repo_id, "a/two");

        let forced = store.repos_for_enrichment(10, true).await.unwrap();
        assert_eq!(forced.len(), 2);
    }

    #[tokio::test]
    async fn test_update_unknown_repo_fails() {
        let (_dir, store) = store();
        let err = store
            .update_repo_enrichment(RepoEnrichmentUpdate::status(
                "ghost/repo",
                EnrichmentStatus::NotFound,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
