//! Append-only prediction record store over SQLite.
//!
//! One row per successful prediction; rows are never updated or deleted,
//! and `id` assignment (autoincrement) is what "most recent" means.

use std::path::Path;

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use materna_schema::FeatureVector;

/// A prediction event about to be persisted.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub name: String,
    pub features: FeatureVector,
    pub risk: String,
}

/// A persisted prediction row. `id` stays server-side; the JSON shape is
/// exactly what `GET /latest` returns.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct HealthRecord {
    #[serde(skip_serializing)]
    pub id: i64,
    pub name: String,
    pub age: f64,
    pub systolic_bp: f64,
    pub diastolic_bp: f64,
    pub bs: f64,
    pub body_temp: f64,
    pub heart_rate: f64,
    pub risk: String,
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// Open (creating if absent) the database file and ensure the schema
    /// exists before any traffic is accepted.
    pub async fn open(path: &Path) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// In-memory store for tests. A single connection keeps the database
    /// alive for the pool's lifetime.
    pub async fn open_in_memory() -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS health_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                age REAL NOT NULL,
                systolic_bp REAL NOT NULL,
                diastolic_bp REAL NOT NULL,
                bs REAL NOT NULL,
                body_temp REAL NOT NULL,
                heart_rate REAL NOT NULL,
                risk TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Append one record; returns the assigned row id.
    pub async fn insert(&self, record: &NewRecord) -> Result<i64, sqlx::Error> {
        let f = record.features.as_slice();
        let result = sqlx::query(
            "INSERT INTO health_records
                (name, age, systolic_bp, diastolic_bp, bs, body_temp, heart_rate, risk)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.name)
        .bind(f[0])
        .bind(f[1])
        .bind(f[2])
        .bind(f[3])
        .bind(f[4])
        .bind(f[5])
        .bind(&record.risk)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// The most recently inserted row, if any.
    pub async fn latest(&self) -> Result<Option<HealthRecord>, sqlx::Error> {
        sqlx::query_as::<_, HealthRecord>(
            "SELECT id, name, age, systolic_bp, diastolic_bp, bs, body_temp, heart_rate, risk
             FROM health_records
             ORDER BY id DESC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
    }

    /// Total number of persisted rows.
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM health_records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
