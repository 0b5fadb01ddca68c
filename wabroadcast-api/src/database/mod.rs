pub mod categories;
pub mod contacts;
pub mod migrations;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use shared_types::EntityType;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Record not found")]
    NotFound,

    #[error("A record with this {0} already exists")]
    Duplicate(&'static str),

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Category is not valid for contacts (entityType={0})")]
    CategoryNotForContacts(EntityType),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type DbResult<T> = Result<T, DbError>;

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

#[derive(Clone)]
pub struct AsyncDbConnection {
    pool: Arc<Pool<SqliteConnectionManager>>,
}

impl AsyncDbConnection {
    pub fn new(pool: Pool<SqliteConnectionManager>) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    pub async fn lock(&self) -> DbResult<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }
}

pub struct Database {
    pub async_connection: AsyncDbConnection,
}

impl Database {
    /// Open (or create) the database file and run migrations
    pub fn new(db_path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Migrate on a plain connection first so pooled connections see the schema
        {
            let conn = Connection::open(db_path)?;
            migrations::run_migrations(&conn)?;
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        let pool = Pool::builder().max_size(8).build(manager)?;

        Ok(Database {
            async_connection: AsyncDbConnection::new(pool),
        })
    }

    pub async fn ping(&self) -> bool {
        match self.async_connection.lock().await {
            Ok(conn) => conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).is_ok(),
            Err(e) => {
                tracing::warn!("Database ping failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Database;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Database on a throwaway file; keep the `TempDir` alive for the test.
    pub fn temp_database() -> (Arc<Database>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("test.sqlite3")).unwrap();
        (Arc::new(db), dir)
    }
}
