pub mod migration;
pub mod ops;
pub mod projector;
pub mod schema;

use rusqlite::{Connection, ErrorCode, Transaction};
use std::path::Path;
use std::time::Duration;

use flair_core::error::FlairError;

/// Errors raised by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid stored json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl DbError {
    fn sqlite_code(&self) -> Option<ErrorCode> {
        match self {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => Some(e.code),
            _ => None,
        }
    }

    /// A UNIQUE, PRIMARY KEY or FOREIGN KEY constraint rejected the write.
    pub fn is_conflict(&self) -> bool {
        self.sqlite_code() == Some(ErrorCode::ConstraintViolation)
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(
            self.sqlite_code(),
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen)
        )
    }
}

impl From<DbError> for FlairError {
    fn from(err: DbError) -> Self {
        if err.is_unavailable() {
            FlairError::unavailable(err.to_string())
        } else if err.is_conflict() {
            FlairError::Conflict {
                resource: "row",
                id: err.to_string(),
            }
        } else if let DbError::Json(e) = err {
            FlairError::Serialization(e.to_string())
        } else {
            FlairError::Database(err.to_string())
        }
    }
}

/// Open (or create) the Flair database at the given path and run migrations.
pub fn open_db(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    migration::run_migrations(&conn)?;
    Ok(conn)
}

/// Run `f` inside a transaction, committing only if it returns `Ok`.
pub fn with_transaction<T, E, F>(conn: &mut Connection, f: F) -> std::result::Result<T, E>
where
    E: From<DbError>,
    F: FnOnce(&Transaction) -> std::result::Result<T, E>,
{
    let tx = conn.transaction().map_err(DbError::from)?;
    let value = f(&tx)?;
    tx.commit().map_err(DbError::from)?;
    Ok(value)
}

/// Open an in-memory database for testing.
pub fn open_memory_db() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    migration::run_migrations(&conn)?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_db_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flair.db");
        let conn = open_db(&path, Duration::from_millis(100)).unwrap();
        assert!(path.exists());
        assert!(migration::is_current(&conn).unwrap());
    }

    #[test]
    fn test_constraint_maps_to_conflict() {
        let conn = open_memory_db().unwrap();
        conn.execute(
            "INSERT INTO profiles (id, external_id, username, display_name, created_at)
             VALUES ('a', 'ext', 'u', 'd', 'now')",
            [],
        )
        .unwrap();
        let err: DbError = conn
            .execute(
                "INSERT INTO profiles (id, external_id, username, display_name, created_at)
                 VALUES ('b', 'ext', 'u', 'd', 'now')",
                [],
            )
            .unwrap_err()
            .into();
        assert!(err.is_conflict());
        assert!(matches!(FlairError::from(err), FlairError::Conflict { .. }));
    }

    #[test]
    fn test_with_transaction_rolls_back_on_error() {
        let mut conn = open_memory_db().unwrap();
        let result: std::result::Result<(), FlairError> = with_transaction(&mut conn, |tx| {
            ops::resolve_profile_id(tx, "ext_rollback")?;
            Err(FlairError::validation("abort"))
        });
        assert!(result.is_err());
        assert!(ops::get_profile_id_by_external_id(&conn, "ext_rollback")
            .unwrap()
            .is_none());
    }
}
