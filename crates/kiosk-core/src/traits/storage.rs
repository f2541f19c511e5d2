// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the persistence mirror.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::KioskError;
use crate::events::QueueEvent;
use crate::traits::adapter::KioskAdapter;
use crate::types::{Station, Ticket};

/// Stations and tickets read back from persistence at startup.
#[derive(Debug, Clone, Default)]
pub struct StoredQueue {
    pub stations: Vec<Station>,
    pub tickets: Vec<Ticket>,
}

/// Durable mirror of the queue store.
///
/// The store never reads from this adapter after startup; it only pushes
/// the events of accepted transitions, in order.
#[async_trait]
pub trait QueueStorage: KioskAdapter {
    /// Opens the backend (connections, migrations).
    async fn initialize(&self) -> Result<(), KioskError>;

    /// All stations, plus every ticket that is still active or was created
    /// at or after `since`.
    async fn load(&self, since: DateTime<Utc>) -> Result<StoredQueue, KioskError>;

    /// Writes the entities changed by one accepted transition.
    async fn apply(&self, event: &QueueEvent) -> Result<(), KioskError>;

    /// Flushes pending writes and releases the backend.
    async fn close(&self) -> Result<(), KioskError>;
}
