//! SQLite connection setup and schema provisioning for the catalog tables.

use crate::domain::model::{Author, Book, CatalogModel};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;

/// Opens a pool against `database_url`, creating the file if it is missing.
///
/// Foreign keys are switched on for every connection; without it SQLite
/// ignores the `ON DELETE CASCADE` on `livro.autor_id`.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        // Concurrent writers wait instead of failing with "database is locked".
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(opts)
        .await
}

/// Reader and writer pools over the same database.
///
/// Every write transaction goes through `writer`, which holds a single
/// connection. A transaction that reads before it writes can then never race
/// another connection for the write lock, which SQLite answers with an
/// immediate `SQLITE_BUSY` instead of waiting on the busy timeout.
#[derive(Clone)]
pub struct CatalogPools {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl CatalogPools {
    /// Uses one pool for both roles. Only sound when that pool has a single
    /// connection, e.g. an in-memory database.
    pub fn shared(pool: SqlitePool) -> Self {
        Self {
            reader: pool.clone(),
            writer: pool,
        }
    }

    pub async fn close(&self) {
        self.writer.close().await;
        self.reader.close().await;
    }
}

/// Opens `max_readers` read connections plus the single writer connection.
pub async fn open(database_url: &str, max_readers: u32) -> Result<CatalogPools, sqlx::Error> {
    let writer = connect(database_url, 1).await?;
    let reader = connect(database_url, max_readers).await?;
    Ok(CatalogPools { reader, writer })
}

/// Creates the catalog tables if absent. Parents are created before children.
pub async fn apply_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for stmt in schema_statements() {
        sqlx::query(stmt).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    tracing::debug!(
        tables = ?[Author::table_name(), Book::table_name()],
        "catalog schema ensured"
    );
    Ok(())
}

fn schema_statements() -> Vec<&'static str> {
    let mut out = vec![Author::create_table_sql()];
    out.extend_from_slice(Author::post_create_sql());
    out.push(Book::create_table_sql());
    out.extend_from_slice(Book::post_create_sql());
    out
}

#[cfg(test)]
pub(crate) async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    // Each in-memory connection is its own database, so the pool holds exactly one.
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(opts)
        .await?;
    apply_schema(&pool).await?;
    Ok(pool)
}
