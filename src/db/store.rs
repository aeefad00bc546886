//! Shared store handle.
//!
//! One SQLite connection, opened at startup and injected into every
//! handler. Requests hold the lock for a short fixed sequence of
//! statements and never across an `.await`.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use super::{open_database, open_memory_database, DatabaseError};

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (and migrate) the store at `path`.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        let conn = open_database(path)?;
        tracing::info!(path = %path.display(), "Store opened");
        Ok(Self::from_connection(conn))
    }

    /// In-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Acquire the connection for the duration of one request.
    pub fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    /// Close the underlying connection. Fails if handlers still hold clones.
    pub fn close(self) -> Result<(), DatabaseError> {
        let mutex = Arc::try_unwrap(self.conn).map_err(|_| DatabaseError::StillShared)?;
        let conn = mutex.into_inner().map_err(|_| DatabaseError::LockPoisoned)?;
        conn.close().map_err(|(_, e)| DatabaseError::from(e))?;
        tracing::info!("Store closed");
        Ok(())
    }
}
