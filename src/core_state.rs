//! Shared application state.
//!
//! `CoreState` is wrapped in `Arc` at startup and shared by every HTTP
//! handler. Each logical operation opens its own short-lived connection;
//! the database's transactional guarantee, not shared in-process state,
//! is what keeps cascades atomic.

use std::path::PathBuf;

use crate::db;
use crate::notify::NotificationHub;

pub struct CoreState {
    /// Path of the lifecycle database.
    db_path: PathBuf,
    /// Fire-and-forget notification sink for cascade follow-ups.
    pub notifications: NotificationHub,
}

impl CoreState {
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            db_path,
            notifications: NotificationHub::new(),
        }
    }

    /// Open a connection to the lifecycle database.
    ///
    /// Runs pending migrations on first open; cheap after that. Most common
    /// operation in handlers.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path).map_err(CoreError::Database)
    }

    pub fn db_path(&self) -> &PathBuf {
        &self.db_path
    }
}

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),
}
