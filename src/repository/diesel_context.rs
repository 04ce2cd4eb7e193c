//! Diesel database context for managing connections and repository access.
//!
//! Provides a unified entry point for database operations using Diesel ORM
//! over SQLite (via SyncConnectionWrapper).

use std::path::Path;

use diesel_async::SimpleAsyncConnection;

use super::diesel_gateway::DieselGateway;
use super::diesel_pool::{AsyncSqlitePool, DieselError};

/// Relations in the store, in dependency order.
pub const TABLES: &[&str] = &[
    "entities",
    "filings",
    "filing_info",
    "filer_info",
    "trades",
    "notes",
];

/// Diesel database context that owns the connection factory and hands out
/// repositories.
///
/// # Example
/// ```ignore
/// let ctx = DieselDbContext::new(&db_path);
/// ctx.init_schema().await?;
/// let known = ctx.gateway().known_entity_ids().await?;
/// ```
#[derive(Clone)]
pub struct DieselDbContext {
    pool: AsyncSqlitePool,
}

impl DieselDbContext {
    /// Create a new database context from a file path.
    pub fn new(db_path: &Path) -> Self {
        Self {
            pool: AsyncSqlitePool::from_path(db_path),
        }
    }

    /// Create a new database context from a database URL such as
    /// `sqlite:path/to/part335.db` or a plain file path.
    pub fn from_url(database_url: &str) -> Self {
        Self {
            pool: AsyncSqlitePool::new(database_url),
        }
    }

    /// Get the underlying connection factory.
    pub fn pool(&self) -> &AsyncSqlitePool {
        &self.pool
    }

    /// Get the persistence gateway.
    pub fn gateway(&self) -> DieselGateway {
        DieselGateway::new(self.pool.clone())
    }

    /// Initialize the database schema.
    ///
    /// This creates the necessary tables if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                cert_number BIGINT PRIMARY KEY NOT NULL,
                bank_name TEXT,
                city TEXT,
                state TEXT
            );

            CREATE TABLE IF NOT EXISTS filings (
                disclosure_id BIGINT PRIMARY KEY NOT NULL,
                cert_number BIGINT NOT NULL REFERENCES entities(cert_number),
                last_name TEXT,
                first_name TEXT,
                middle TEXT,
                form_type TEXT,
                filing_date TEXT,
                url TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_filings_cert ON filings(cert_number);

            CREATE TABLE IF NOT EXISTS filing_info (
                disclosure_id BIGINT NOT NULL REFERENCES filings(disclosure_id),
                info_number INTEGER NOT NULL,
                issuer_name TEXT,
                issuer_ticker TEXT,
                report_date TEXT,
                amendment_date TEXT,
                exit_filing BOOLEAN,
                PRIMARY KEY (disclosure_id, info_number)
            );

            CREATE TABLE IF NOT EXISTS filer_info (
                disclosure_id BIGINT NOT NULL REFERENCES filings(disclosure_id),
                info_number INTEGER NOT NULL,
                title TEXT,
                name TEXT,
                city TEXT,
                state TEXT,
                street TEXT,
                zip TEXT,
                PRIMARY KEY (disclosure_id, info_number)
            );

            CREATE TABLE IF NOT EXISTS trades (
                disclosure_id BIGINT NOT NULL REFERENCES filings(disclosure_id),
                trade_number INTEGER NOT NULL,
                derivative BOOLEAN NOT NULL DEFAULT 0,
                security TEXT,
                trade_date TEXT,
                exec_date TEXT,
                code TEXT,
                v_flag BOOLEAN NOT NULL DEFAULT 0,
                trade_shares BIGINT,
                trade_acq BOOLEAN,
                trade_price DOUBLE,
                shares_owned BIGINT,
                direct_own BOOLEAN,
                nature_of_own TEXT,
                exercise_price DOUBLE,
                exercise_date TEXT,
                expire_date TEXT,
                underlying_security TEXT,
                underlying_shares BIGINT,
                PRIMARY KEY (disclosure_id, trade_number)
            );

            CREATE TABLE IF NOT EXISTS notes (
                disclosure_id BIGINT NOT NULL REFERENCES filings(disclosure_id),
                note_number INTEGER NOT NULL,
                footnote TEXT NOT NULL,
                PRIMARY KEY (disclosure_id, note_number)
            );
            "#,
        )
        .await
    }

    /// Get list of all tables in the database.
    pub async fn list_tables(&self) -> Result<Vec<String>, DieselError> {
        let mut conn = self.pool.get().await?;
        let rows: Vec<TableName> = diesel_async::RunQueryDsl::load(
            diesel::sql_query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            ),
            &mut conn,
        )
        .await?;
        Ok(rows.into_iter().map(|r| r.name).collect())
    }

    /// Row counts of every relation, in dependency order.
    pub async fn table_counts(&self) -> Result<Vec<(&'static str, i64)>, DieselError> {
        let mut conn = self.pool.get().await?;
        let mut counts = Vec::with_capacity(TABLES.len());
        for table in TABLES {
            // Table names come from the fixed list above.
            let row: RowCount = diesel_async::RunQueryDsl::get_result(
                diesel::sql_query(format!("SELECT COUNT(*) AS count FROM {table}")),
                &mut conn,
            )
            .await?;
            counts.push((*table, row.count));
        }
        Ok(counts)
    }
}

#[derive(diesel::QueryableByName)]
struct TableName {
    #[diesel(sql_type = diesel::sql_types::Text)]
    name: String,
}

#[derive(diesel::QueryableByName)]
struct RowCount {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_diesel_context() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let ctx = DieselDbContext::new(&db_path);

        // Initialize schema twice; the second run is a no-op.
        ctx.init_schema().await.unwrap();
        ctx.init_schema().await.unwrap();

        let tables = ctx.list_tables().await.unwrap();
        for table in TABLES {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }

        let counts = ctx.table_counts().await.unwrap();
        assert_eq!(counts.len(), TABLES.len());
        assert!(counts.iter().all(|(_, n)| *n == 0));
    }

    #[tokio::test]
    async fn test_from_url_accepts_sqlite_prefix() {
        let dir = tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("url.db").display());

        let ctx = DieselDbContext::from_url(&url);
        ctx.init_schema().await.unwrap();
        assert!(dir.path().join("url.db").exists());
    }
}
