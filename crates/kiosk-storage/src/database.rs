// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database handle: opening, PRAGMAs, and migrations.

use std::path::Path;

use kiosk_core::KioskError;
use tracing::debug;

use crate::migrations::run_migrations;

/// How long a statement waits on a locked database before failing.
const BUSY_TIMEOUT_MS: u32 = 5000;

/// An open, migrated SQLite database.
///
/// Every statement runs on the single background thread owned by the
/// `tokio-rusqlite` connection, which makes this the only writer.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and bring its
    /// schema up to date.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, KioskError> {
        if path != ":memory:" {
            if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| KioskError::Storage {
                    source: Box::new(e),
                })?;
            }
        }

        // Migrations run on a plain connection first so their error type
        // stays separate from the query path.
        let setup_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), KioskError> {
            let mut conn = rusqlite::Connection::open(&setup_path).map_err(storage_err)?;
            if wal_mode {
                let mode: String = conn
                    .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                    .map_err(storage_err)?;
                debug!(%mode, "journal mode set");
            }
            run_migrations(&mut conn)
        })
        .await
        .map_err(|e| KioskError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| KioskError::Storage {
                source: Box::new(e),
            })?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "busy_timeout", BUSY_TIMEOUT_MS)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The shared connection. All queries go through `call`.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }
}

fn storage_err(e: rusqlite::Error) -> KioskError {
    KioskError::Storage {
        source: Box::new(e),
    }
}

/// Convert a tokio-rusqlite error into KioskError::Storage.
pub(crate) fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> KioskError {
    KioskError::Storage {
        source: Box::new(e),
    }
}
