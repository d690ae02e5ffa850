// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread. Do NOT open additional connections for writes.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use chanbridge_core::ChanbridgeError;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::migrations;

/// Convert a tokio-rusqlite error into a [`ChanbridgeError`].
///
/// A closed background thread surfaces as [`ChanbridgeError::Closed`] so
/// callers can tell shutdown apart from query failures.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ChanbridgeError {
    match e {
        tokio_rusqlite::Error::ConnectionClosed => ChanbridgeError::Closed {
            what: "channel store".into(),
        },
        other => ChanbridgeError::storage(other),
    }
}

/// Handle to the SQLite database backing the channel store.
pub struct Database {
    conn: Connection,
    closed: AtomicBool,
}

impl Database {
    /// Opens (creating if needed) the database file and runs pending migrations.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, ChanbridgeError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(ChanbridgeError::storage)?;
        }

        let conn = Connection::open(path).await.map_err(|e| map_tr_err(tokio_rusqlite::Error::Error(e)))?;
        let db = Self::init(conn, wal_mode).await?;
        debug!(path, wal_mode, "channel database opened");
        Ok(db)
    }

    /// Opens a private in-memory database. Used by tests and dry runs.
    pub async fn open_in_memory() -> Result<Self, ChanbridgeError> {
        let conn = Connection::open_in_memory().await.map_err(|e| map_tr_err(tokio_rusqlite::Error::Error(e)))?;
        Self::init(conn, false).await
    }

    async fn init(conn: Connection, wal_mode: bool) -> Result<Self, ChanbridgeError> {
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            if wal_mode {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            }
            conn.execute_batch(
                "PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        conn.call(|conn| migrations::run_migrations(conn))
            .await
            .map_err(|e: tokio_rusqlite::Error<refinery::Error>| ChanbridgeError::storage(e))?;

        Ok(Self {
            conn,
            closed: AtomicBool::new(false),
        })
    }

    /// Returns the underlying async connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Returns `true` once [`Database::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Checkpoints the WAL and stops the background thread.
    ///
    /// Idempotent: only the first call does any work.
    pub async fn close(&self) -> Result<(), ChanbridgeError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.clone().close().await.map_err(map_tr_err)?;
        debug!("channel database closed");
        Ok(())
    }
}
