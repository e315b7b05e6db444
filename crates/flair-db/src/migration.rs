use rusqlite::Connection;

use crate::schema;
use crate::Result;

const LATEST_VERSION: i64 = 1;

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(schema::CREATE_SCHEMA_VERSION)?;

    let current = get_version(conn)?;

    if current < 1 {
        migrate_v1(conn)?;
    }

    Ok(())
}

pub fn get_version(conn: &Connection) -> Result<i64> {
    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

pub fn is_current(conn: &Connection) -> Result<bool> {
    Ok(get_version(conn)? >= LATEST_VERSION)
}

fn set_version(conn: &Connection, version: i64) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_version (version, applied_at) VALUES (?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Migration v1: profiles, saved items, collections and community posts.
fn migrate_v1(conn: &Connection) -> Result<()> {
    tracing::info!("applying migration v1: initial schema");
    let tx = conn.unchecked_transaction()?;
    for stmt in &schema::ALL_TABLES[1..] {
        tx.execute_batch(stmt)?;
    }
    tx.execute_batch(schema::CREATE_INDEXES)?;
    set_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(get_version(&conn).unwrap(), 1);
        assert!(is_current(&conn).unwrap());
    }

    #[test]
    fn test_all_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        for table in [
            "profiles",
            "follows",
            "saved_items",
            "collections",
            "collection_items",
            "community_posts",
        ] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {table}");
        }
    }
}
