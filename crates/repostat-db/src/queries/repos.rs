//! Extracted repository query operations.
//!
//! Covers seeding repositories, selecting the enrichment work set, and
//! applying per-repository enrichment updates.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use repostat_common::{EnrichmentStatus, Error, Result};

use crate::models::{ExtractedRepo, RepoEnrichmentUpdate};

const REPO_COLUMNS: &str = "repo_id, url, source_id, title, found_at, stars, forks, \
                            last_pushed_at, description, language, enrichment_status";

fn parse_time(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn row_to_repo(row: &Row<'_>) -> rusqlite::Result<ExtractedRepo> {
    Ok(ExtractedRepo {
        repo_id: row.get(0)?,
        url: row.get(1)?,
        source_id: row.get(2)?,
        title: row.get(3)?,
        found_at: parse_time(row.get(4)?).unwrap_or_else(Utc::now),
        stars: row.get(5)?,
        forks: row.get(6)?,
        last_pushed_at: parse_time(row.get(7)?),
        description: row.get(8)?,
        language: row.get(9)?,
        enrichment_status: row
            .get::<_, String>(10)?
            .parse()
            .unwrap_or(EnrichmentStatus::Pending),
    })
}

/// Insert a repository if it is not already stored.
///
/// Existing rows are left untouched, including their enrichment data.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `repo` - Repository to store
///
/// # Returns
///
/// * `Ok(true)` - A new row was written
/// * `Ok(false)` - The repository was already stored
/// * `Err(Error)` - If a database error occurs
pub fn insert_repo(conn: &Connection, repo: &ExtractedRepo) -> Result<bool> {
    let inserted = conn
        .execute(
            "INSERT INTO extracted_repos (repo_id, url, source_id, title, found_at, enrichment_status)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(repo_id) DO NOTHING",
            params![
                repo.repo_id,
                repo.url,
                repo.source_id,
                repo.title,
                repo.found_at.to_rfc3339(),
                repo.enrichment_status.as_str(),
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(inserted > 0)
}

/// Get a repository by its `owner/name` identifier.
///
/// # Returns
///
/// * `Ok(Some(ExtractedRepo))` - The repository if found
/// * `Ok(None)` - If the repository is not stored
/// * `Err(Error)` - If a database error occurs
pub fn get_repo(conn: &Connection, repo_id: &str) -> Result<Option<ExtractedRepo>> {
    conn.query_row(
        &format!("SELECT {REPO_COLUMNS} FROM extracted_repos WHERE repo_id = ?"),
        [repo_id],
        row_to_repo,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Select up to `limit` repositories that need enrichment.
///
/// With `force`, any repository qualifies; otherwise only those whose status
/// is not `SUCCESS`. Oldest discoveries come first.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `limit` - Maximum number of repositories to return
/// * `force` - Include repositories that already succeeded
pub fn list_repos_for_enrichment(
    conn: &Connection,
    limit: usize,
    force: bool,
) -> Result<Vec<ExtractedRepo>> {
    let filter = if force {
        ""
    } else {
        "WHERE enrichment_status != 'SUCCESS'"
    };

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {REPO_COLUMNS} FROM extracted_repos {filter}
             ORDER BY found_at ASC, repo_id ASC
             LIMIT ?"
        ))
        .map_err(|e| Error::database(e.to_string()))?;

    let repos = stmt
        .query_map([limit as i64], row_to_repo)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(repos)
}

/// Apply the result of one enrichment attempt.
///
/// With stats, every metadata column is overwritten along with the status;
/// without, only the status changes. Unknown repositories are `NotFound`.
pub fn update_repo_enrichment(conn: &Connection, update: &RepoEnrichmentUpdate) -> Result<()> {
    let changed = match &update.stats {
        Some(stats) => conn.execute(
            "UPDATE extracted_repos
             SET stars = ?, forks = ?, last_pushed_at = ?, description = ?, language = ?,
                 enrichment_status = ?
             WHERE repo_id = ?",
            params![
                stats.stars,
                stats.forks,
                stats.last_pushed.to_rfc3339(),
                stats.description,
                stats.language,
                update.status.as_str(),
                update.repo_id,
            ],
        ),
        None => conn.execute(
            "UPDATE extracted_repos SET enrichment_status = ? WHERE repo_id = ?",
            params![update.status.as_str(), update.repo_id],
        ),
    }
    .map_err(|e| Error::database(e.to_string()))?;

    if changed == 0 {
        return Err(Error::not_found(format!("repo {}", update.repo_id)));
    }

    Ok(())
}

/// Count repositories per enrichment status. Every status is present.
pub fn count_by_status(conn: &Connection) -> Result<Vec<(EnrichmentStatus, i64)>> {
    let mut stmt = conn
        .prepare("SELECT enrichment_status, COUNT(*) FROM extracted_repos GROUP BY enrichment_status")
        .map_err(|e| Error::database(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    let mut counts: Vec<(EnrichmentStatus, i64)> =
        EnrichmentStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for (status, count) in rows {
        let status = status.parse().unwrap_or(EnrichmentStatus::Pending);
        if let Some(slot) = counts.iter_mut().find(|(s, _)| *s == status) {
            slot.1 += count;
        }
    }

    Ok(counts)
}
