// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the QueueStorage trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use kiosk_config::model::StorageConfig;
use kiosk_core::{
    AdapterType, HealthStatus, KioskAdapter, KioskError, QueueEvent, QueueStorage, Station,
    StationId, StoredQueue, Ticket,
};

use crate::database::{Database, map_tr_err};
use crate::queries::{stations, tickets};

/// SQLite-backed queue mirror.
///
/// The database is opened on [`QueueStorage::initialize`]; every other
/// operation fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    ///
    /// [`initialize`]: QueueStorage::initialize
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    pub fn database(&self) -> Result<&Database, KioskError> {
        self.db.get().ok_or_else(|| KioskError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(&self, db: &Database) -> Result<(), KioskError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl KioskAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, KioskError> {
        let Ok(db) = self.database() else {
            return Ok(HealthStatus::Unhealthy("storage not initialized".into()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl QueueStorage for SqliteStorage {
    async fn initialize(&self) -> Result<(), KioskError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| KioskError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn load(&self, since: DateTime<Utc>) -> Result<StoredQueue, KioskError> {
        let db = self.database()?;
        let (stations, tickets) = db
            .connection()
            .call(move |conn| -> Result<(Vec<Station>, Vec<Ticket>), rusqlite::Error> {
                let tx = conn.transaction()?;
                let stations = stations::list(&tx)?;
                let tickets = tickets::active_or_since(&tx, since)?;
                tx.commit()?;
                Ok((stations, tickets))
            })
            .await
            .map_err(map_tr_err)?;
        debug!(
            stations = stations.len(),
            tickets = tickets.len(),
            %since,
            "queue history loaded"
        );
        Ok(StoredQueue { stations, tickets })
    }

    async fn apply(&self, event: &QueueEvent) -> Result<(), KioskError> {
        let db = self.database()?;
        let changed_tickets: Vec<Ticket> = event.changed_tickets().into_iter().cloned().collect();
        let changed_stations: Vec<Station> =
            event.changed_stations().into_iter().cloned().collect();
        let removed: Option<StationId> = event.removed_station().cloned();

        db.connection()
            .call(move |conn| -> Result<(), rusqlite::Error> {
                let tx = conn.transaction()?;
                for ticket in &changed_tickets {
                    tickets::upsert(&tx, ticket)?;
                }
                for station in &changed_stations {
                    stations::upsert(&tx, station)?;
                }
                if let Some(id) = &removed {
                    stations::delete(&tx, id)?;
                }
                tx.commit()
            })
            .await
            .map_err(map_tr_err)?;
        debug!(kind = event.kind(), "queue event persisted");
        Ok(())
    }

    async fn close(&self) -> Result<(), KioskError> {
        let db = self.database()?;
        self.checkpoint(db).await
    }
}
