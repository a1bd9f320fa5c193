//! SQLite persistence for the uploaded plan set and ingest history
//!
//! The uploaded set is small (a session's worth of sheet uploads), so it
//! is stored as one row per plan and rewritten wholesale on save. The
//! static base never touches the database — it is reloaded from the
//! provider connectors on every startup.

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::info;

use crate::catalog::PlanPersistence;
use crate::error::{Error, Result};
use crate::models::{IngestRecord, Plan, UploadFormat};

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
}

impl Database {
    /// Create a new database connection pool and run migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Uses a temporary file rather than `:memory:` because each pooled
    /// connection would otherwise see its own empty in-memory database.
    pub fn in_memory() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir().join(format!("cota_test_{}.db", id));

        // Remove any existing file
        let _ = std::fs::remove_file(&path);

        Self::new(&path.to_string_lossy())
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS uploaded_plans (
                dedup_key TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                provider TEXT NOT NULL,
                plan_name TEXT NOT NULL,
                category TEXT NOT NULL,
                asset_value REAL NOT NULL,
                term_months INTEGER NOT NULL,
                monthly_installment REAL NOT NULL,
                admin_fee REAL NOT NULL,
                stats TEXT,
                features TEXT NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS ingest_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL,
                format TEXT,
                ingested INTEGER NOT NULL DEFAULT 0,
                skipped INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;

        info!("Database migrations complete");
        Ok(())
    }

    /// Record one ingestion in history
    pub fn record_ingest(
        &self,
        filename: &str,
        format: Option<UploadFormat>,
        ingested: i64,
        skipped: i64,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO ingest_history (filename, format, ingested, skipped)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                filename,
                format.map(|f| f.as_str()),
                ingested,
                skipped
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Most recent ingestions, newest first
    pub fn ingest_history(&self, limit: i64) -> Result<Vec<IngestRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, filename, format, ingested, skipped, created_at
            FROM ingest_history
            ORDER BY id DESC
            LIMIT ?
            "#,
        )?;

        let rows = stmt.query_map([limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, filename, format, ingested, skipped, created_at) = row?;
            records.push(IngestRecord {
                id,
                filename,
                format: format.and_then(|f| match f.as_str() {
                    "json" => Some(UploadFormat::Json),
                    "csv" => Some(UploadFormat::Csv),
                    "txt" => Some(UploadFormat::Txt),
                    _ => None,
                }),
                ingested,
                skipped,
                created_at: parse_datetime(&created_at),
            });
        }
        Ok(records)
    }
}

impl PlanPersistence for Database {
    fn load(&self) -> Result<Vec<Plan>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT provider, plan_name, category, asset_value, term_months,
                   monthly_installment, admin_fee, stats, features
            FROM uploaded_plans
            ORDER BY position
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, Option<String>>(7)?,
                row.get::<_, String>(8)?,
            ))
        })?;

        let mut plans = Vec::new();
        for row in rows {
            let (provider, plan_name, category, asset_value, term_months, installment, fee, stats, features) =
                row?;
            plans.push(Plan {
                provider: provider.parse().map_err(Error::InvalidData)?,
                plan_name,
                category: category.parse().map_err(Error::InvalidData)?,
                asset_value,
                term_months: term_months as u32,
                monthly_installment: installment,
                admin_fee: fee,
                stats: stats.as_deref().map(serde_json::from_str).transpose()?,
                features: serde_json::from_str(&features)?,
            });
        }
        Ok(plans)
    }

    fn save(&self, plans: &[Plan]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM uploaded_plans", [])?;
        for (position, plan) in plans.iter().enumerate() {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO uploaded_plans
                    (dedup_key, position, provider, plan_name, category, asset_value,
                     term_months, monthly_installment, admin_fee, stats, features)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
                params![
                    plan.dedup_key(),
                    position as i64,
                    plan.provider.as_str(),
                    plan.plan_name,
                    plan.category.as_str(),
                    plan.asset_value,
                    plan.term_months as i64,
                    plan.monthly_installment,
                    plan.admin_fee,
                    plan.stats.as_ref().map(serde_json::to_string).transpose()?,
                    serde_json::to_string(&plan.features)?,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM uploaded_plans", [])?;
        Ok(())
    }
}
