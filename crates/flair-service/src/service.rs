use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rusqlite::Connection;

use flair_core::config::FlairConfig;
use flair_core::error::FlairError;

/// Async entry point to the Flair data layer.
///
/// Every store call runs on the blocking pool and is bounded by the configured
/// timeout; an elapsed timeout surfaces as a retryable `StoreUnavailable`.
/// A call that reported a timeout never touches the store afterwards.
#[derive(Clone)]
pub struct FlairService {
    pub(crate) conn: Arc<Mutex<Connection>>,
    timeout: Duration,
    pub(crate) seed_defaults: bool,
}

impl FlairService {
    /// Wrap an already migrated connection.
    pub fn new(conn: Connection, config: &FlairConfig) -> Result<Self, FlairError> {
        config.validate()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            timeout: config.store_timeout(),
            seed_defaults: config.seed_default_collections,
        })
    }

    /// Open the database named by `config`, creating its directory if needed.
    pub fn open(config: &FlairConfig) -> Result<Self, FlairError> {
        let path = config.db_path()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = flair_db::open_db(&path, config.busy_timeout())?;
        tracing::debug!(path = %path.display(), "opened flair database");
        Self::new(conn, config)
    }

    /// Service over a fresh in-memory database.
    pub fn in_memory() -> Result<Self, FlairError> {
        Self::in_memory_with(&FlairConfig::default())
    }

    pub fn in_memory_with(config: &FlairConfig) -> Result<Self, FlairError> {
        let conn = flair_db::open_memory_db()?;
        Self::new(conn, config)
    }

    /// Run `f` against the connection on the blocking pool.
    pub(crate) async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, FlairError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, FlairError> + Send + 'static,
    {
        self.run_until(op, move |conn, _| f(conn)).await
    }

    /// Run `f` inside a transaction on the blocking pool. The transaction is
    /// rolled back instead of committed once the deadline has passed.
    pub(crate) async fn run_tx<T, F>(&self, op: &'static str, f: F) -> Result<T, FlairError>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Transaction) -> Result<T, FlairError> + Send + 'static,
    {
        self.run_until(op, move |conn, deadline| {
            flair_db::with_transaction(conn, |tx| {
                let value = f(tx)?;
                check_deadline(op, deadline)?;
                Ok(value)
            })
        })
        .await
    }

    async fn run_until<T, F>(&self, op: &'static str, f: F) -> Result<T, FlairError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, Instant) -> Result<T, FlairError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let deadline = Instant::now() + self.timeout;
        let task = tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| FlairError::unavailable("connection lock poisoned"))?;
            // The caller has already been told this call failed.
            check_deadline(op, deadline)?;
            f(&mut *guard, deadline)
        });

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(FlairError::unavailable(format!("{op} failed to run: {e}"))),
            Err(_) => {
                tracing::warn!(op, timeout_ms = self.timeout.as_millis() as u64, "store operation timed out");
                Err(FlairError::unavailable(format!(
                    "{op} timed out after {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }
}

fn check_deadline(op: &'static str, deadline: Instant) -> Result<(), FlairError> {
    if Instant::now() >= deadline {
        tracing::debug!(op, "dropping store operation after its deadline");
        return Err(FlairError::unavailable(format!("{op} missed its deadline")));
    }
    Ok(())
}

pub(crate) fn require_non_empty(value: &str, what: &str) -> Result<String, FlairError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FlairError::validation(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flair_core::models::collection::NewCollection;

    #[test]
    fn test_require_non_empty() {
        assert_eq!(require_non_empty("  Wishlist ", "name").unwrap(), "Wishlist");
        let err = require_non_empty("   ", "name").unwrap_err();
        assert!(matches!(err, FlairError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_timeout_surfaces_store_unavailable() {
        let config = FlairConfig {
            store_timeout_ms: 100,
            ..FlairConfig::default()
        };
        let service = FlairService::in_memory_with(&config).unwrap();

        let held = Arc::clone(&service.conn);
        let blocker = std::thread::spawn(move || {
            let _guard = held.lock().unwrap();
            std::thread::sleep(Duration::from_millis(400));
        });
        std::thread::sleep(Duration::from_millis(50));

        let err = service.resolve_profile_id("ext_slow").await.unwrap_err();
        assert!(err.is_retryable(), "unexpected error: {err}");
        blocker.join().unwrap();

        // The store recovers once the lock is released.
        assert!(service.resolve_profile_id("ext_slow").await.is_ok());
    }

    #[tokio::test]
    async fn test_timed_out_write_never_lands() {
        let config = FlairConfig {
            store_timeout_ms: 100,
            seed_default_collections: false,
            ..FlairConfig::default()
        };
        let service = FlairService::in_memory_with(&config).unwrap();
        let p = service.resolve_profile_id("ext_ghost").await.unwrap();

        let held = Arc::clone(&service.conn);
        let blocker = std::thread::spawn(move || {
            let _guard = held.lock().unwrap();
            std::thread::sleep(Duration::from_millis(400));
        });
        std::thread::sleep(Duration::from_millis(50));

        let err = service
            .create_collection(&p, NewCollection::named("Ghost"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        blocker.join().unwrap();

        // Let the abandoned task take the lock and give up.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(service.list_collections(&p).await.unwrap().is_empty());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = FlairConfig {
            store_timeout_ms: 0,
            ..FlairConfig::default()
        };
        assert!(FlairService::in_memory_with(&config).is_err());
    }

    #[tokio::test]
    async fn test_open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = FlairConfig {
            db_path: Some(dir.path().join("nested").join("flair.db")),
            ..FlairConfig::default()
        };
        let service = FlairService::open(&config).unwrap();
        service.resolve_profile_id("ext_disk").await.unwrap();
        assert!(dir.path().join("nested").join("flair.db").exists());
    }
}
