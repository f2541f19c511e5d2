// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory `QueueStorage` for tests that need persistence semantics
//! without SQLite.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kiosk_core::{
    AdapterType, HealthStatus, KioskAdapter, KioskError, QueueEvent, QueueStorage, Station,
    StationId, StoredQueue, Ticket, TicketId,
};

/// Stores stations and tickets in maps. Writes can be made to fail.
#[derive(Default)]
pub struct MemoryStorage {
    stations: Mutex<BTreeMap<StationId, Station>>,
    tickets: Mutex<HashMap<TicketId, Ticket>>,
    fail_writes: AtomicBool,
    applied: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with existing records, as if from a previous run.
    pub fn with_records(stations: Vec<Station>, tickets: Vec<Ticket>) -> Self {
        let storage = Self::new();
        storage
            .stations
            .lock()
            .unwrap()
            .extend(stations.into_iter().map(|s| (s.id.clone(), s)));
        storage
            .tickets
            .lock()
            .unwrap()
            .extend(tickets.into_iter().map(|t| (t.id.clone(), t)));
        storage
    }

    /// Make subsequent `apply` calls fail until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of events written successfully.
    pub fn applied(&self) -> usize {
        self.applied.load(Ordering::SeqCst)
    }

    pub fn station(&self, id: &StationId) -> Option<Station> {
        self.stations.lock().unwrap().get(id).cloned()
    }

    pub fn ticket(&self, id: &TicketId) -> Option<Ticket> {
        self.tickets.lock().unwrap().get(id).cloned()
    }

    pub fn ticket_count(&self) -> usize {
        self.tickets.lock().unwrap().len()
    }
}

#[async_trait]
impl KioskAdapter for MemoryStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, KioskError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Ok(HealthStatus::Degraded("writes failing".to_string()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }
}

#[async_trait]
impl QueueStorage for MemoryStorage {
    async fn initialize(&self) -> Result<(), KioskError> {
        Ok(())
    }

    async fn load(&self, since: DateTime<Utc>) -> Result<StoredQueue, KioskError> {
        let stations = self.stations.lock().unwrap().values().cloned().collect();
        let tickets = self
            .tickets
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.status.is_active() || t.created_at >= since)
            .cloned()
            .collect();
        Ok(StoredQueue { stations, tickets })
    }

    async fn apply(&self, event: &QueueEvent) -> Result<(), KioskError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KioskError::Storage {
                source: Box::new(std::io::Error::other("injected write failure")),
            });
        }
        {
            let mut tickets = self.tickets.lock().unwrap();
            for ticket in event.changed_tickets() {
                tickets.insert(ticket.id.clone(), ticket.clone());
            }
        }
        {
            let mut stations = self.stations.lock().unwrap();
            for station in event.changed_stations() {
                stations.insert(station.id.clone(), station.clone());
            }
            if let Some(id) = event.removed_station() {
                stations.remove(id);
            }
        }
        self.applied.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> Result<(), KioskError> {
        Ok(())
    }
}
