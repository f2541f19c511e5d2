// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup shared by `serve` and the one-shot commands: pick the clock,
//! open storage, restore the queue store, and seed configured stations.

use std::sync::{Arc, Mutex, PoisonError};

use kiosk_config::KioskConfig;
use kiosk_config::model::GeneralConfig;
use kiosk_core::{Clock, FixedOffsetClock, KioskError, QueueEvent, QueueStorage, SystemClock};
use kiosk_queue::{NewStation, Notification, QueueStore, SubscriptionId};
use kiosk_storage::{SiteLock, SqliteStorage, history_since};
use tracing::{debug, info};

/// An opened store together with the storage it mirrors to.
///
/// Holds the database's [`SiteLock`] until dropped, so at most one process
/// restores and mutates a given queue at a time.
pub struct QueueRuntime {
    pub store: Arc<QueueStore>,
    pub storage: Arc<SqliteStorage>,
    _lock: SiteLock,
}

impl QueueRuntime {
    /// Lock the database, open SQLite storage, and restore the queue from it.
    ///
    /// Fails fast with [`KioskError::InUse`] while another kiosk process
    /// (usually `serve`) owns the database.
    pub async fn open(config: &KioskConfig) -> Result<Self, KioskError> {
        let clock = build_clock(&config.kiosk)?;
        let lock = SiteLock::acquire(&config.storage.database_path)?;
        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;
        let store = restore_store(config, clock, storage.as_ref()).await?;
        Ok(Self {
            store,
            storage,
            _lock: lock,
        })
    }

    /// Checkpoint and release storage.
    pub async fn close(&self) -> Result<(), KioskError> {
        self.storage.close().await
    }
}

/// The configured UTC offset, or the host's local zone.
pub fn build_clock(general: &GeneralConfig) -> Result<Arc<dyn Clock>, KioskError> {
    match general.utc_offset_minutes {
        Some(minutes) => FixedOffsetClock::from_minutes(minutes)
            .map(|clock| Arc::new(clock) as Arc<dyn Clock>)
            .ok_or_else(|| {
                KioskError::Config(format!(
                    "kiosk.utc_offset_minutes {minutes} is out of range"
                ))
            }),
        None => Ok(Arc::new(SystemClock)),
    }
}

/// Rebuild the store from `storage`, persist any repairs, then add
/// configured stations that storage does not know yet.
pub async fn restore_store(
    config: &KioskConfig,
    clock: Arc<dyn Clock>,
    storage: &dyn QueueStorage,
) -> Result<Arc<QueueStore>, KioskError> {
    let since = history_since(clock.as_ref(), config.storage.history_days);
    let stored = storage.load(since).await?;
    let (store, repairs) =
        QueueStore::restore(config.service_catalog(), clock, stored.stations, stored.tickets);
    persist(storage, &repairs).await?;

    let recorder = EventRecorder::attach(&store);
    for seed in &config.stations {
        let station = seed.to_station();
        if store.station(&station.id).is_some() {
            continue;
        }
        store.add_station(NewStation::from(station))?;
    }
    let seeded = recorder.finish(&store);
    if !seeded.is_empty() {
        info!(count = seeded.len(), "seeded stations from configuration");
    }
    persist(storage, &seeded).await?;

    Ok(Arc::new(store))
}

/// Write events to storage in order, stopping at the first failure.
pub async fn persist(storage: &dyn QueueStorage, events: &[QueueEvent]) -> Result<(), KioskError> {
    for event in events {
        storage.apply(event).await?;
    }
    if !events.is_empty() {
        debug!(count = events.len(), "events persisted");
    }
    Ok(())
}

/// Collects the events a store publishes between `attach` and `finish`.
pub struct EventRecorder {
    events: Arc<Mutex<Vec<QueueEvent>>>,
    subscription: SubscriptionId,
}

impl EventRecorder {
    pub fn attach(store: &QueueStore) -> Self {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let subscription = store.subscribe(move |n: &Notification| {
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(n.event.clone());
        });
        Self {
            events,
            subscription,
        }
    }

    /// Detach from the store and return what was recorded.
    pub fn finish(self, store: &QueueStore) -> Vec<QueueEvent> {
        store.unsubscribe(self.subscription);
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
