//! Record repository for SQLite.
//!
//! One table, five columns:
//!
//! ```sql
//! records(id INTEGER PRIMARY KEY, name TEXT, sprite_url TEXT, artwork_url TEXT, base_experience INTEGER)
//! ```
//!
//! `id` is the table's rowid, so re-ingesting an id updates the row in
//! place and `list_all` returns rows in id order.

use std::str::FromStr;

use dexter_core::DbConfig;
use dexter_core::error::AppError;
use dexter_core::models::Record;
use dexter_core::traits::RecordStore;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

/// Schema statements, applied in order by [`RecordRepository::migrate`].
const MIGRATIONS: &[&str] = &[r#"
    CREATE TABLE IF NOT EXISTS records (
        id INTEGER PRIMARY KEY CHECK (id > 0),
        name TEXT NOT NULL,
        sprite_url TEXT,
        artwork_url TEXT,
        base_experience INTEGER
    )
    "#];

const RECORD_COLUMNS: &str = "id, name, sprite_url, artwork_url, base_experience";

/// Repository for record persistence in SQLite.
///
/// # Examples
///
/// ```no_run
/// use dexter_core::DbConfig;
/// use dexter_db::RecordRepository;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = RecordRepository::connect("sqlite://dexter.db", &DbConfig::default()).await?;
/// repo.migrate().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RecordRepository {
    pool: SqlitePool,
}

impl RecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database at `database_url`.
    pub async fn connect(database_url: &str, config: &DbConfig) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the `records` table if it does not exist.
    pub async fn migrate(&self) -> Result<(), AppError> {
        for statement in MIGRATIONS {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Inserts or replaces every record in one transaction.
    ///
    /// If any row fails the transaction is rolled back and no row of the
    /// batch is visible.
    pub async fn upsert_batch(&self, records: &[Record]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0u64;

        for record in records {
            let result = sqlx::query(
                r#"
                INSERT INTO records (id, name, sprite_url, artwork_url, base_experience)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    sprite_url = excluded.sprite_url,
                    artwork_url = excluded.artwork_url,
                    base_experience = excluded.base_experience
                "#,
            )
            .bind(record.id)
            .bind(&record.name)
            .bind(&record.sprite_url)
            .bind(&record.artwork_url)
            .bind(record.base_experience)
            .execute(&mut *tx)
            .await?;

            written += result.rows_affected();
        }

        tx.commit().await?;
        debug!(written, "Batch committed");
        Ok(written)
    }

    /// Returns all records ordered by id.
    pub async fn list_all(&self) -> Result<Vec<Record>, AppError> {
        let query = format!("SELECT {} FROM records ORDER BY id", RECORD_COLUMNS);
        let records = sqlx::query_as::<_, Record>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    /// Deletes every record. Returns the number of removed rows.
    pub async fn clear(&self) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM records")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count(&self) -> Result<u64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

// =============================================================================
// Trait Implementation: RecordStore
// =============================================================================

impl RecordStore for RecordRepository {
    async fn upsert_batch(&self, records: &[Record]) -> Result<u64, AppError> {
        RecordRepository::upsert_batch(self, records).await
    }

    async fn list_all(&self) -> Result<Vec<Record>, AppError> {
        RecordRepository::list_all(self).await
    }

    async fn clear(&self) -> Result<u64, AppError> {
        RecordRepository::clear(self).await
    }

    async fn count(&self) -> Result<u64, AppError> {
        RecordRepository::count(self).await
    }
}
