use crate::traits::EntryStore;
use crate::types::{Entry, Result, UpsertSummary};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self { db })
    }

    /// Apply the schema in `migrations/`.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        debug!("Database schema is up to date");
        Ok(())
    }

    pub fn get_db_pool(&self) -> &PgPool {
        &self.db
    }

    /// Insert one entry unless its link is already stored. Returns whether a
    /// row was written.
    pub async fn insert_entry(&self, entry: &Entry) -> std::result::Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO posts (title, content, pub_time, link)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (link) DO NOTHING
            "#,
        )
        .bind(&entry.title)
        .bind(&entry.content)
        .bind(entry.pub_time())
        .bind(&entry.link)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_entries(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }
}

/// Errors that belong to a single row (bad encoding, constraint other than
/// the link conflict, ...) rather than to the connection or the server.
fn is_row_level(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Encode(_) => true,
        sqlx::Error::Database(db) => db.code().is_some_and(|code| is_row_level_sqlstate(&code)),
        _ => false,
    }
}

/// SQLSTATE classes `22` (data exception) and `23` (integrity constraint
/// violation). Everything else, e.g. `57P01` admin shutdown or `53300` too
/// many connections, aborts the batch.
pub fn is_row_level_sqlstate(code: &str) -> bool {
    code.starts_with("22") || code.starts_with("23")
}

#[async_trait]
impl EntryStore for PgStore {
    async fn upsert_all(&self, entries: &[Entry]) -> Result<UpsertSummary> {
        let mut summary = UpsertSummary::default();

        for entry in entries {
            match self.insert_entry(entry).await {
                Ok(true) => summary.inserted += 1,
                Ok(false) => summary.duplicates += 1,
                Err(e) if is_row_level(&e) => {
                    warn!("Could not store entry {}: {}", entry.link, e);
                    summary.failed += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            "Stored {} new entries out of {} total entries ({} duplicates, {} failed)",
            summary.inserted,
            entries.len(),
            summary.duplicates,
            summary.failed
        );
        Ok(summary)
    }

    async fn query_recent(&self, n: usize) -> Result<Vec<Entry>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT title, content, pub_time, link
            FROM posts
            ORDER BY pub_time DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(n).unwrap_or(i64::MAX))
        .fetch_all(&self.db)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(Entry::from_row(
                row.try_get("title")?,
                row.try_get("content")?,
                row.try_get("pub_time")?,
                row.try_get("link")?,
            )?);
        }

        Ok(entries)
    }

    async fn close(&self) {
        self.db.close().await;
    }
}
