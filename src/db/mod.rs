//! Database layer for the kanban ordering server.

pub mod boards;
pub mod columns;
pub mod integrity;
pub mod siblings;
pub mod tasks;

use crate::config::{BoardsConfig, ReorderConfig};
use crate::error::{OrderError, OrderResult};
use anyhow::Result;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::warn;

pub use siblings::SqliteSiblings;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Default time a connection waits on another writer's lock.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    reorder: ReorderConfig,
    boards: BoardsConfig,
}

impl Database {
    /// Open or create the database at the given path with default settings.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(
            path,
            DEFAULT_BUSY_TIMEOUT_MS,
            ReorderConfig::default(),
            BoardsConfig::default(),
        )
    }

    /// Open or create the database at the given path.
    pub fn open_with<P: AsRef<Path>>(
        path: P,
        busy_timeout_ms: u64,
        reorder: ReorderConfig,
        boards: BoardsConfig,
    ) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL lets readers proceed while a reorder transaction holds the write lock.
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout={};",
            busy_timeout_ms
        ))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            reorder,
            boards,
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with(ReorderConfig::default(), BoardsConfig::default())
    }

    /// Open an in-memory database with explicit settings (for testing).
    pub fn open_in_memory_with(reorder: ReorderConfig, boards: BoardsConfig) -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
            reorder,
            boards,
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations.
    fn run_migrations(&self) -> Result<()> {
        let mut conn = self.lock();
        embedded::migrations::runner().run(&mut *conn)?;
        Ok(())
    }

    /// Ordering settings this handle was opened with.
    pub fn reorder_config(&self) -> &ReorderConfig {
        &self.reorder
    }

    /// Board settings this handle was opened with.
    pub fn boards_config(&self) -> &BoardsConfig {
        &self.boards
    }

    // A panic while holding the lock drops (and so rolls back) any open
    // transaction, which leaves the connection usable.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Execute a read with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> OrderResult<T>
    where
        F: FnOnce(&Connection) -> OrderResult<T>,
    {
        let conn = self.lock();
        f(&conn)
    }

    /// Run `f` inside an IMMEDIATE transaction and commit it.
    ///
    /// The write lock is taken before `f` reads anything, so concurrent
    /// writers to the same list are serialized. Conflicts (a busy database or
    /// a conditioned write that matched no row) roll back and rerun `f` from
    /// scratch, up to `reorder.max_attempts` times. Any other error rolls back
    /// and is returned as is.
    pub fn with_ordered_tx<F, T>(&self, f: F) -> OrderResult<T>
    where
        F: Fn(&Transaction<'_>) -> OrderResult<T>,
    {
        let max_attempts = self.reorder.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let result = {
                let mut conn = self.lock();
                run_immediate(&mut conn, &f)
            };

            match result {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    warn!(
                        attempt,
                        max_attempts,
                        error = %err,
                        "Ordering transaction conflicted, retrying"
                    );
                    std::thread::sleep(Duration::from_millis(
                        self.reorder.retry_backoff_ms * u64::from(attempt),
                    ));
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

fn run_immediate<F, T>(conn: &mut Connection, f: &F) -> OrderResult<T>
where
    F: Fn(&Transaction<'_>) -> OrderResult<T>,
{
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Longest accepted board, column or task name.
pub const MAX_NAME_LEN: usize = 255;

/// Trim a required name and check it is non-empty and not too long.
pub(crate) fn validate_name(field: &str, value: &str) -> OrderResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(OrderError::validation(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(OrderError::validation(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
