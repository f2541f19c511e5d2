// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the kiosk queue system.
//!
//! This crate holds the data model (services, stations, tickets), the
//! queue events emitted by the store, the shared error type, the injectable
//! clock, and the adapter traits implemented by speech and storage backends.

pub mod clock;
pub mod error;
pub mod events;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use clock::{Clock, FixedOffsetClock, SystemClock};
pub use error::KioskError;
pub use events::QueueEvent;
pub use types::{
    AdapterType, HealthStatus, Service, ServiceCatalog, ServiceId, Snapshot, Station, StationId,
    StationStatus, Ticket, TicketId, TicketStatus, Voice,
};

pub use traits::{KioskAdapter, QueueStorage, SpeechBackend, StoredQueue};
