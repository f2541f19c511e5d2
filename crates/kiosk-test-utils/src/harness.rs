// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness around a queue store.
//!
//! `StoreHarness` builds a `QueueStore` with a manual clock, a small service
//! catalog, optional stations, and a subscription that records every event.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Utc};
use kiosk_core::{QueueEvent, Service, ServiceCatalog, ServiceId, StationId};
use kiosk_queue::{NewStation, Notification, QueueStore};

use crate::clock::ManualClock;

/// Services every harness starts with unless replaced.
pub const DEFAULT_SERVICES: &[(&str, &str)] = &[
    ("enrollment", "Enrollment"),
    ("payment", "Payment"),
    ("records", "Records"),
];

/// Builder for a [`StoreHarness`].
pub struct StoreHarnessBuilder {
    services: Vec<Service>,
    stations: Vec<NewStation>,
    start: DateTime<Utc>,
    offset: FixedOffset,
}

impl StoreHarnessBuilder {
    fn new() -> Self {
        Self {
            services: DEFAULT_SERVICES
                .iter()
                .map(|(id, label)| service(id, label))
                .collect(),
            stations: Vec::new(),
            start: Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap(),
            offset: FixedOffset::east_opt(0).unwrap(),
        }
    }

    /// Replace the service catalog.
    pub fn with_services(mut self, services: &[(&str, &str)]) -> Self {
        self.services = services
            .iter()
            .map(|(id, label)| service(id, label))
            .collect();
        self
    }

    /// Add an open station that serves every service.
    pub fn with_open_station(self, id: &str) -> Self {
        self.with_station(id, &[], true)
    }

    /// Add a station restricted to `services` (empty = all).
    pub fn with_station(mut self, id: &str, services: &[&str], open: bool) -> Self {
        self.stations.push(NewStation {
            id: StationId::new(id),
            name: format!("Station {id}"),
            service_ids: services.iter().map(|s| ServiceId::new(*s)).collect::<BTreeSet<_>>(),
            open,
        });
        self
    }

    /// Start the clock at `start` instead of 08:00 UTC on 2026-03-02.
    pub fn starting_at(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    /// Use a local offset (minutes east of UTC) for day boundaries.
    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.offset = FixedOffset::east_opt(minutes * 60).unwrap();
        self
    }

    pub fn build(self) -> StoreHarness {
        let clock = Arc::new(ManualClock::with_offset(self.start, self.offset));
        let store = Arc::new(QueueStore::new(
            ServiceCatalog::new(self.services),
            clock.clone(),
        ));
        for station in self.stations {
            store.add_station(station).unwrap();
        }

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        store.subscribe(move |n: &Notification| {
            sink.lock().unwrap().push(n.event.clone());
        });

        StoreHarness {
            store,
            clock,
            events,
        }
    }
}

fn service(id: &str, label: &str) -> Service {
    Service {
        id: ServiceId::new(id),
        label: label.to_string(),
        description: String::new(),
        icon: String::new(),
        prefix: None,
    }
}

/// A queue store plus the handles tests need to drive and observe it.
pub struct StoreHarness {
    pub store: Arc<QueueStore>,
    pub clock: Arc<ManualClock>,
    events: Arc<Mutex<Vec<QueueEvent>>>,
}

impl StoreHarness {
    pub fn builder() -> StoreHarnessBuilder {
        StoreHarnessBuilder::new()
    }

    /// Events published after the harness finished setting up its stations.
    pub fn events(&self) -> Vec<QueueEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Forget recorded events.
    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    /// Move the clock forward.
    pub fn advance(&self, by: TimeDelta) {
        self.clock.advance(by);
    }
}
