use async_trait::async_trait;
use serde::Serialize;
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tokio::sync::Mutex;

use crate::create_timestamp;
use crate::grader::Verdict;

/// One stored grading record, as served by the records API.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct VerdictRow {
    pub id: i64,
    pub user: String,
    pub url: String,
    /// `None` means the submission was correct
    pub error: Option<String>,
    pub stdout: String,
    pub stderr: String,
    pub created_time: String,
}

/// Append-only verdict store shared by every pipeline run.
///
/// Implementations must accept concurrent `record` calls; ids are assigned
/// in append order.
#[async_trait]
pub trait VerdictSink: Send + Sync {
    /// Appends one verdict and returns its assigned id.
    async fn record(&self, verdict: &Verdict) -> anyhow::Result<i64>;

    /// Returns every stored record in append order.
    async fn list(&self) -> anyhow::Result<Vec<VerdictRow>>;
}

/// Sqlite-backed sink. The default deployment keeps the database in memory,
/// living and dying with the process; a file path makes it persistent.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(db_path: Option<&str>) -> sqlx::Result<Self> {
        let db_url = match db_path {
            Some(path) => format!("sqlite://{path}?mode=rwc"), // rwc = read/write/create
            None => "sqlite::memory:".to_string(),
        };

        // sqlite::memory: databases are per connection, so the pool stays at
        // one; this also serializes appends from concurrent pipeline runs
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&db_url)
            .await?;

        for sql in &[
            "PRAGMA busy_timeout = 2000;",
            "PRAGMA journal_mode = WAL;",
            "PRAGMA synchronous = NORMAL;",
            r"
            CREATE TABLE IF NOT EXISTS records (
                id            INTEGER  PRIMARY KEY AUTOINCREMENT,
                user          TEXT     NOT NULL,
                url           TEXT     NOT NULL,
                iserror       BOOLEAN  NOT NULL,
                error         TEXT     NOT NULL DEFAULT '',
                stdout        TEXT     NOT NULL,
                stderr        TEXT     NOT NULL,
                created_time  TEXT     NOT NULL
            );",
        ] {
            sqlx::query(sql).execute(&pool).await?;
        }

        log::info!(
            "Initialized verdict store ({})",
            db_path.unwrap_or("in-memory")
        );

        Ok(Self { pool })
    }
}

#[async_trait]
impl VerdictSink for SqliteStore {
    async fn record(&self, verdict: &Verdict) -> anyhow::Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO records (user, url, iserror, error, stdout, stderr, created_time)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&verdict.user)
        .bind(&verdict.url)
        .bind(verdict.error.is_some())
        .bind(verdict.error.unwrap_or(""))
        .bind(&verdict.stdout)
        .bind(&verdict.stderr)
        .bind(create_timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn list(&self) -> anyhow::Result<Vec<VerdictRow>> {
        let rows = sqlx::query(
            "SELECT id, user, url, iserror, error, stdout, stderr, created_time
             FROM records ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let iserror: bool = row.try_get("iserror")?;
            let error: String = row.try_get("error")?;
            records.push(VerdictRow {
                id: row.try_get("id")?,
                user: row.try_get("user")?,
                url: row.try_get("url")?,
                error: iserror.then_some(error),
                stdout: row.try_get("stdout")?,
                stderr: row.try_get("stderr")?,
                created_time: row.try_get("created_time")?,
            });
        }

        Ok(records)
    }
}

/// Plain in-memory sink; the test double, and the embedding option for
/// callers that bring their own persistence.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<VerdictRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerdictSink for MemoryStore {
    async fn record(&self, verdict: &Verdict) -> anyhow::Result<i64> {
        let mut records = self.records.lock().await;
        let id = records.len() as i64 + 1;
        records.push(VerdictRow {
            id,
            user: verdict.user.clone(),
            url: verdict.url.clone(),
            error: verdict.error.map(str::to_owned),
            stdout: verdict.stdout.clone(),
            stderr: verdict.stderr.clone(),
            created_time: create_timestamp(),
        });
        Ok(id)
    }

    async fn list(&self) -> anyhow::Result<Vec<VerdictRow>> {
        Ok(self.records.lock().await.clone())
    }
}
