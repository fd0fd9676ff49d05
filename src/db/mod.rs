// src/db/mod.rs

//! SQLite persistence for recipes and their reference data

pub mod models;
pub mod schema;

use crate::error::{Error, Result};
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Create (or upgrade) the database at `db_path` and seed reference data
pub fn init(db_path: impl AsRef<Path>) -> Result<()> {
    let db_path = db_path.as_ref();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::fs(parent, e))?;
    }

    let conn = connect(db_path)?;
    schema::migrate(&conn)?;
    schema::seed(&conn)?;
    info!("Database initialized at {}", db_path.display());
    Ok(())
}

/// Open an existing database with the connection pragmas applied
pub fn open(db_path: impl AsRef<Path>) -> Result<Connection> {
    let db_path = db_path.as_ref();
    if !db_path.exists() {
        return Err(Error::InitError(format!(
            "database does not exist: {} (run `rezept init`)",
            db_path.display()
        )));
    }

    connect(db_path)
}

fn connect(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(conn)
}

/// Run `f` inside a transaction, committing on success
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction<'_>) -> Result<T>,
{
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_missing_database() {
        let dir = tempdir().unwrap();
        let err = open(dir.path().join("missing.db")).unwrap_err();
        assert!(matches!(err, Error::InitError(_)));
    }

    #[test]
    fn test_init_creates_parent_and_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("rezept.db");
        init(&db_path).unwrap();
        init(&db_path).unwrap();

        let conn = open(&db_path).unwrap();
        let units: i64 = conn
            .query_row("SELECT COUNT(*) FROM units", [], |row| row.get(0))
            .unwrap();
        assert_eq!(units, 13);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("rezept.db");
        init(&db_path).unwrap();
        let mut conn = open(&db_path).unwrap();

        let result: Result<()> = transaction(&mut conn, |tx| {
            tx.execute("INSERT INTO recipes (name) VALUES ('Brot')", [])?;
            Err(Error::InitError("abort".into()))
        });
        assert!(result.is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
