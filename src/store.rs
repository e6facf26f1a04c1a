//! PostgreSQL store adapter for the domain collection.
//!
//! One table, `domains (name TEXT PRIMARY KEY, added_at TIMESTAMPTZ)`. The
//! primary key is the sole dedup mechanism and is never dropped: bulk loads
//! stage rows through a COPY into a temp table and merge with
//! `ON CONFLICT DO NOTHING` inside a single transaction per batch, so the
//! uniqueness invariant holds at every point visible to other readers and a
//! failed batch rolls back whole without disturbing committed batches.

use futures::future;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use sqlx::PgPool;

use crate::error::AppError;
use crate::filter::DomainFilter;

const SELECT_ALL: &str = "SELECT name FROM domains ORDER BY added_at, name";
const SELECT_ALL_SORTED: &str = "SELECT name FROM domains ORDER BY name";
const SELECT_MATCH: &str =
    "SELECT name FROM domains WHERE strpos(name, $1) > 0 ORDER BY added_at, name";
const SELECT_MATCH_SORTED: &str =
    "SELECT name FROM domains WHERE strpos(name, $1) > 0 ORDER BY name";

/// Outcome of a batch removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemovalReport {
    pub removed: u64,
    pub not_found: u64,
}

/// Store adapter over a pooled PostgreSQL connection.
#[derive(Clone)]
pub struct PgDomainStore {
    pool: PgPool,
}

impl PgDomainStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the schema if it does not exist. Idempotent.
    pub async fn init_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS domains (
                name TEXT PRIMARY KEY,
                added_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;

        // Pattern-ops index speeds up prefix-style substring filters.
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_domains_name_pattern
             ON domains (name text_pattern_ops)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts a batch of domains, silently skipping names already stored.
    /// Returns the number of rows actually inserted.
    ///
    /// The batch is staged via COPY into a temp table and merged in one
    /// transaction. Duplicates inside the batch itself collapse through
    /// `SELECT DISTINCT`.
    pub async fn bulk_insert(&self, domains: &[String]) -> Result<u64, AppError> {
        if domains.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("CREATE TEMP TABLE staged_domains (name TEXT) ON COMMIT DROP")
            .execute(&mut *tx)
            .await?;

        let mut copy = tx
            .copy_in_raw("COPY staged_domains (name) FROM STDIN WITH (FORMAT text)")
            .await?;
        copy.send(copy_payload(domains).as_bytes()).await?;
        copy.finish().await?;

        let inserted = sqlx::query(
            "INSERT INTO domains (name)
             SELECT DISTINCT name FROM staged_domains
             ON CONFLICT (name) DO NOTHING",
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(inserted)
    }

    /// Streams domain names without materializing the result set.
    ///
    /// Substring filters push down to SQL; regex filters are applied lazily
    /// on the streamed rows. Insertion order by default, lexicographic with
    /// `sorted`. Dropping the stream releases the underlying cursor.
    pub fn stream<'a>(
        &'a self,
        filter: Option<&'a DomainFilter>,
        sorted: bool,
    ) -> BoxStream<'a, Result<String, AppError>> {
        let unfiltered = if sorted { SELECT_ALL_SORTED } else { SELECT_ALL };

        match filter {
            None => sqlx::query_scalar::<_, String>(unfiltered)
                .fetch(&self.pool)
                .map_err(AppError::from)
                .boxed(),
            Some(f) => match f.sql_substring() {
                Some(substring) => {
                    let sql = if sorted { SELECT_MATCH_SORTED } else { SELECT_MATCH };
                    sqlx::query_scalar::<_, String>(sql)
                        .bind(substring.to_string())
                        .fetch(&self.pool)
                        .map_err(AppError::from)
                        .boxed()
                }
                None => sqlx::query_scalar::<_, String>(unfiltered)
                    .fetch(&self.pool)
                    .map_err(AppError::from)
                    .try_filter(move |name| future::ready(f.matches(name)))
                    .boxed(),
            },
        }
    }

    /// Counts stored domains, optionally filtered.
    pub async fn count(&self, filter: Option<&DomainFilter>) -> Result<u64, AppError> {
        let count: i64 = match filter {
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM domains")
                    .fetch_one(&self.pool)
                    .await?
            }
            Some(f) => match f.sql_substring() {
                Some(substring) => {
                    sqlx::query_scalar("SELECT COUNT(*) FROM domains WHERE strpos(name, $1) > 0")
                        .bind(substring)
                        .fetch_one(&self.pool)
                        .await?
                }
                None => {
                    // Regex filters cannot push down; count off the stream.
                    let mut stream = self.stream(filter, false);
                    let mut n = 0i64;
                    while stream.try_next().await?.is_some() {
                        n += 1;
                    }
                    n
                }
            },
        };

        Ok(count as u64)
    }

    /// Removes the given names. Idempotent: names not present are counted in
    /// `not_found`, never an error. Duplicate input names count once.
    pub async fn delete(&self, names: &[String]) -> Result<RemovalReport, AppError> {
        let unique: Vec<String> = {
            let mut sorted: Vec<String> = names.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            sorted
        };

        if unique.is_empty() {
            return Ok(RemovalReport {
                removed: 0,
                not_found: 0,
            });
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("CREATE TEMP TABLE staged_removals (name TEXT) ON COMMIT DROP")
            .execute(&mut *tx)
            .await?;

        let mut copy = tx
            .copy_in_raw("COPY staged_removals (name) FROM STDIN WITH (FORMAT text)")
            .await?;
        copy.send(copy_payload(&unique).as_bytes()).await?;
        copy.finish().await?;

        let removed = sqlx::query(
            "DELETE FROM domains USING staged_removals
             WHERE domains.name = staged_removals.name",
        )
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok(RemovalReport {
            removed,
            not_found: unique.len() as u64 - removed,
        })
    }

    /// Removes every domain matching the filter, returning how many went.
    pub async fn delete_by_filter(&self, filter: &DomainFilter) -> Result<u64, AppError> {
        if let Some(substring) = filter.sql_substring() {
            let removed = sqlx::query("DELETE FROM domains WHERE strpos(name, $1) > 0")
                .bind(substring)
                .execute(&self.pool)
                .await?
                .rows_affected();
            return Ok(removed);
        }

        // Regex: stream the matching names first, then delete them by name.
        let matching: Vec<String> = self.stream(Some(filter), false).try_collect().await?;
        let report = self.delete(&matching).await?;
        Ok(report.removed)
    }

    /// Truncates the collection. Returns the number of rows that were stored.
    pub async fn delete_all(&self) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM domains")
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("TRUNCATE TABLE domains")
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(count as u64)
    }
}

/// Serializes names into COPY text format, one row per line. Backslashes,
/// tabs, and carriage returns are escaped so arbitrary (`--no-validate`)
/// input cannot desync the stream. Interior `\r` is reachable because
/// canonicalization only trims the ends of a line.
fn copy_payload(names: &[String]) -> String {
    let mut data = String::with_capacity(names.len() * 32);
    for name in names {
        if name.contains(['\\', '\t', '\r']) {
            for ch in name.chars() {
                match ch {
                    '\\' => data.push_str(r"\\"),
                    '\t' => data.push_str(r"\t"),
                    '\r' => data.push_str(r"\r"),
                    c => data.push(c),
                }
            }
        } else {
            data.push_str(name);
        }
        data.push('\n');
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_payload_is_newline_delimited() {
        let names = vec!["a.com".to_string(), "b.com".to_string()];
        assert_eq!(copy_payload(&names), "a.com\nb.com\n");
    }

    #[test]
    fn copy_payload_escapes_copy_metacharacters() {
        let names = vec!["weird\\name\tcom".to_string()];
        assert_eq!(copy_payload(&names), "weird\\\\name\\tcom\n");
    }

    #[test]
    fn copy_payload_escapes_interior_carriage_return() {
        let names = vec!["split\rname.com".to_string()];
        assert_eq!(copy_payload(&names), "split\\rname.com\n");
    }
}
