// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The queue state store.
//!
//! All stations and tickets live behind one mutex. Every transition runs its
//! check-then-mutate sequence while holding it, so two stations calling the
//! same service can never claim the same ticket and a close can never race a
//! completion. After each accepted transition the store publishes a fresh
//! [`Snapshot`] together with the [`QueueEvent`] that produced it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use kiosk_core::{
    Clock, KioskError, QueueEvent, ServiceCatalog, ServiceId, Snapshot, Station, StationId,
    StationStatus, Ticket, TicketId, TicketStatus,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{issuance, selection};

/// Delivered to subscribers after every accepted transition.
#[derive(Debug, Clone)]
pub struct Notification {
    pub event: QueueEvent,
    pub snapshot: Arc<Snapshot>,
}

/// Handle returned by [`QueueStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn Fn(&Notification) + Send + Sync>;

/// A station to be created by [`QueueStore::add_station`].
#[derive(Debug, Clone)]
pub struct NewStation {
    pub id: StationId,
    pub name: String,
    /// Empty means the station may call any service.
    pub service_ids: BTreeSet<ServiceId>,
    pub open: bool,
}

impl From<Station> for NewStation {
    fn from(station: Station) -> Self {
        Self {
            id: station.id,
            name: station.name,
            service_ids: station.service_ids,
            open: station.status == StationStatus::Open,
        }
    }
}

/// Changes applied by [`QueueStore::update_station`]; `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct StationUpdate {
    pub name: Option<String>,
    pub service_ids: Option<BTreeSet<ServiceId>>,
}

#[derive(Default)]
struct QueueState {
    stations: BTreeMap<StationId, Station>,
    tickets: HashMap<TicketId, Ticket>,
    last_issued_at: Option<DateTime<Utc>>,
    snapshot: Arc<Snapshot>,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
}

impl QueueState {
    fn build_snapshot(&self, version: u64, taken_at: DateTime<Utc>) -> Snapshot {
        let mut active_tickets: Vec<Ticket> = self
            .tickets
            .values()
            .filter(|t| t.status.is_active())
            .cloned()
            .collect();
        active_tickets.sort_by(selection::queue_order);

        Snapshot {
            version,
            taken_at: Some(taken_at),
            stations: self.stations.values().cloned().collect(),
            active_tickets,
        }
    }

    /// Publish the snapshot following `event` and notify subscribers.
    fn commit(&mut self, event: QueueEvent, now: DateTime<Utc>) {
        let snapshot = Arc::new(self.build_snapshot(self.snapshot.version + 1, now));
        self.snapshot = Arc::clone(&snapshot);

        let notification = Notification { event, snapshot };
        for (_, subscriber) in &self.subscribers {
            subscriber(&notification);
        }
    }

    fn station(&self, id: &StationId) -> Result<&Station, KioskError> {
        self.stations
            .get(id)
            .ok_or_else(|| KioskError::station_not_found(id.as_str()))
    }
}

/// Authoritative in-memory queue state.
pub struct QueueStore {
    catalog: ServiceCatalog,
    clock: Arc<dyn Clock>,
    state: Mutex<QueueState>,
}

impl QueueStore {
    /// Create an empty store.
    pub fn new(catalog: ServiceCatalog, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        let mut state = QueueState::default();
        state.snapshot = Arc::new(state.build_snapshot(0, now));
        Self {
            catalog,
            clock,
            state: Mutex::new(state),
        }
    }

    /// Rebuild a store from persisted stations and tickets.
    ///
    /// Inconsistent pairings are repaired: a serving ticket that its station
    /// does not hold goes back to waiting, and a station pointing at a ticket
    /// it is not serving is cleared. Each repair is returned as an event so
    /// the caller can persist it.
    pub fn restore(
        catalog: ServiceCatalog,
        clock: Arc<dyn Clock>,
        stations: Vec<Station>,
        tickets: Vec<Ticket>,
    ) -> (Self, Vec<QueueEvent>) {
        let mut stations: BTreeMap<StationId, Station> =
            stations.into_iter().map(|s| (s.id.clone(), s)).collect();
        let mut tickets: HashMap<TicketId, Ticket> =
            tickets.into_iter().map(|t| (t.id.clone(), t)).collect();
        let mut repairs = Vec::new();

        for station in stations.values_mut() {
            let Some(current) = station.current_ticket_id.clone() else {
                continue;
            };
            let consistent = station.is_open()
                && tickets
                    .get(&current)
                    .is_some_and(|t| t.is_served_by(&station.id));
            if !consistent {
                warn!(
                    station = %station.id,
                    ticket = %current,
                    "station held a ticket it was not serving; clearing"
                );
                station.current_ticket_id = None;
                repairs.push(QueueEvent::StationUpdated {
                    station: station.clone(),
                });
            }
        }

        let mut ticket_ids: Vec<TicketId> = tickets.keys().cloned().collect();
        ticket_ids.sort();
        for id in ticket_ids {
            let Some(ticket) = tickets.get_mut(&id) else {
                continue;
            };
            if ticket.status != TicketStatus::Serving {
                continue;
            }
            let held = ticket
                .served_by
                .as_ref()
                .and_then(|sid| stations.get(sid))
                .is_some_and(|s| s.current_ticket_id.as_ref() == Some(&ticket.id));
            if !held {
                warn!(
                    ticket = %ticket.ticket_number,
                    station = ?ticket.served_by,
                    "serving ticket has no station holding it; returning to queue"
                );
                ticket.status = TicketStatus::Waiting;
                ticket.served_by = None;
                ticket.called_at = None;
                repairs.push(QueueEvent::TicketReleased {
                    ticket: ticket.clone(),
                    station: None,
                });
            }
        }

        let orphaned = tickets
            .values()
            .filter(|t| t.status.is_active() && !catalog.contains(&t.service))
            .count();
        if orphaned > 0 {
            warn!(
                count = orphaned,
                "restored active tickets belong to services no longer configured"
            );
        }

        let last_issued_at = tickets.values().map(|t| t.created_at).max();
        let now = clock.now();
        let mut state = QueueState {
            stations,
            tickets,
            last_issued_at,
            ..QueueState::default()
        };
        state.snapshot = Arc::new(state.build_snapshot(0, now));

        info!(
            stations = state.stations.len(),
            tickets = state.tickets.len(),
            repairs = repairs.len(),
            "queue state restored"
        );

        let store = Self {
            catalog,
            clock,
            state: Mutex::new(state),
        };
        (store, repairs)
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // A subscriber panic leaves the state itself consistent: commits
        // happen after all mutation.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn require_service(&self, service_id: &ServiceId) -> Result<(), KioskError> {
        if self.catalog.contains(service_id) {
            Ok(())
        } else {
            Err(KioskError::InvalidService {
                service_id: service_id.to_string(),
            })
        }
    }

    fn require_services(&self, service_ids: &BTreeSet<ServiceId>) -> Result<(), KioskError> {
        service_ids
            .iter()
            .try_for_each(|id| self.require_service(id))
    }

    /// Issue a new waiting ticket for `service_id`.
    pub fn issue_ticket(&self, service_id: &ServiceId) -> Result<Ticket, KioskError> {
        let service = self
            .catalog
            .get(service_id)
            .ok_or_else(|| KioskError::InvalidService {
                service_id: service_id.to_string(),
            })?;

        let mut guard = self.lock();
        let state = &mut *guard;

        let now = self.clock.now();
        let created_at = match state.last_issued_at {
            Some(previous) if now <= previous => previous + TimeDelta::microseconds(1),
            _ => now,
        };
        let today = self.clock.local_date(created_at);
        let sequence =
            issuance::next_sequence(state.tickets.values(), service_id, today, &*self.clock);

        let ticket = Ticket {
            id: TicketId::new(Uuid::new_v4().to_string()),
            ticket_number: issuance::format_ticket_number(&service.ticket_prefix(), sequence),
            service: service_id.clone(),
            status: TicketStatus::Waiting,
            created_at,
            served_by: None,
            called_at: None,
            served_at: None,
        };
        state.last_issued_at = Some(created_at);
        state.tickets.insert(ticket.id.clone(), ticket.clone());

        info!(ticket = %ticket.ticket_number, service = %service_id, "ticket issued");
        state.commit(
            QueueEvent::TicketIssued {
                ticket: ticket.clone(),
            },
            now,
        );
        Ok(ticket)
    }

    /// Open or close a station.
    ///
    /// Closing a station that is serving returns its ticket to the queue in
    /// the same step. Setting the current status again changes nothing.
    pub fn set_station_status(
        &self,
        station_id: &StationId,
        status: StationStatus,
    ) -> Result<Station, KioskError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let current = state.station(station_id)?;
        if current.status == status {
            debug!(station = %station_id, %status, "station already in requested status");
            return Ok(current.clone());
        }

        let now = self.clock.now();
        let Some(station) = state.stations.get_mut(station_id) else {
            return Err(KioskError::station_not_found(station_id.as_str()));
        };
        station.status = status;

        let event = match status {
            StationStatus::Open => {
                info!(station = %station_id, "station opened");
                QueueEvent::StationOpened {
                    station: station.clone(),
                }
            }
            StationStatus::Closed => {
                let released = match station.current_ticket_id.take() {
                    Some(id) => state.tickets.get_mut(&id).map(|ticket| {
                        ticket.status = TicketStatus::Waiting;
                        ticket.served_by = None;
                        ticket.called_at = None;
                        ticket.clone()
                    }),
                    None => None,
                };
                info!(
                    station = %station_id,
                    released = ?released.as_ref().map(|t| &t.ticket_number),
                    "station closed"
                );
                QueueEvent::StationClosed {
                    station: station.clone(),
                    released,
                }
            }
        };

        let station = station.clone();
        state.commit(event, now);
        Ok(station)
    }

    /// Have `station_id` call the next waiting ticket of `service_id`.
    ///
    /// Returns `Ok(None)` when nobody is waiting for that service.
    pub fn call_next(
        &self,
        station_id: &StationId,
        service_id: &ServiceId,
    ) -> Result<Option<Ticket>, KioskError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let station = state.station(station_id)?;
        self.require_service(service_id)?;
        if !station.is_open() {
            return Err(KioskError::StationClosed {
                station_id: station_id.to_string(),
            });
        }
        if station.is_busy() {
            return Err(KioskError::StationBusy {
                station_id: station_id.to_string(),
            });
        }
        if !station.serves(service_id) {
            return Err(KioskError::ServiceNotOffered {
                station_id: station_id.to_string(),
                service_id: service_id.to_string(),
            });
        }

        let Some(next_id) =
            selection::select_next(state.tickets.values(), service_id).map(|t| t.id.clone())
        else {
            debug!(station = %station_id, service = %service_id, "no tickets waiting");
            return Ok(None);
        };

        let now = self.clock.now();
        let (Some(ticket), Some(station)) = (
            state.tickets.get_mut(&next_id),
            state.stations.get_mut(station_id),
        ) else {
            return Err(KioskError::Internal(format!(
                "selected ticket {next_id} vanished during call"
            )));
        };

        ticket.status = TicketStatus::Serving;
        ticket.served_by = Some(station_id.clone());
        ticket.called_at = Some(now);
        station.current_ticket_id = Some(ticket.id.clone());

        let ticket = ticket.clone();
        let station = station.clone();
        info!(
            ticket = %ticket.ticket_number,
            station = %station_id,
            "ticket called"
        );
        state.commit(
            QueueEvent::TicketCalled {
                ticket: ticket.clone(),
                station,
            },
            now,
        );
        Ok(Some(ticket))
    }

    /// Mark the station's current ticket served and free the station.
    pub fn complete_ticket(&self, station_id: &StationId) -> Result<Ticket, KioskError> {
        self.finish_current(station_id, TicketStatus::Served)
    }

    /// Mark the station's current ticket skipped (no-show) and free the
    /// station. Skipped tickets are never re-queued.
    pub fn skip_ticket(&self, station_id: &StationId) -> Result<Ticket, KioskError> {
        self.finish_current(station_id, TicketStatus::Skipped)
    }

    fn finish_current(
        &self,
        station_id: &StationId,
        outcome: TicketStatus,
    ) -> Result<Ticket, KioskError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let Some(station) = state.stations.get_mut(station_id) else {
            return Err(KioskError::station_not_found(station_id.as_str()));
        };
        let Some(ticket_id) = station.current_ticket_id.clone() else {
            return Err(KioskError::NotFound {
                entity: "current ticket for station",
                id: station_id.to_string(),
            });
        };
        let Some(ticket) = state.tickets.get_mut(&ticket_id) else {
            return Err(KioskError::ticket_not_found(ticket_id.as_str()));
        };

        let now = self.clock.now();
        ticket.status = outcome;
        if outcome == TicketStatus::Served {
            ticket.served_at = Some(now);
        }
        station.current_ticket_id = None;

        let ticket = ticket.clone();
        let station = station.clone();
        let event = if outcome == TicketStatus::Served {
            info!(ticket = %ticket.ticket_number, station = %station_id, "ticket completed");
            QueueEvent::TicketCompleted {
                ticket: ticket.clone(),
                station,
            }
        } else {
            info!(ticket = %ticket.ticket_number, station = %station_id, "ticket skipped");
            QueueEvent::TicketSkipped {
                ticket: ticket.clone(),
                station,
            }
        };
        state.commit(event, now);
        Ok(ticket)
    }

    /// Register a new station.
    pub fn add_station(&self, new: NewStation) -> Result<Station, KioskError> {
        self.require_services(&new.service_ids)?;

        let mut guard = self.lock();
        let state = &mut *guard;
        if state.stations.contains_key(&new.id) {
            return Err(KioskError::AlreadyExists {
                entity: "station",
                id: new.id.to_string(),
            });
        }

        let station = Station {
            id: new.id,
            name: new.name,
            status: if new.open {
                StationStatus::Open
            } else {
                StationStatus::Closed
            },
            service_ids: new.service_ids,
            current_ticket_id: None,
        };
        state
            .stations
            .insert(station.id.clone(), station.clone());

        info!(station = %station.id, name = %station.name, "station added");
        state.commit(
            QueueEvent::StationAdded {
                station: station.clone(),
            },
            self.clock.now(),
        );
        Ok(station)
    }

    /// Rename a station or change the services it calls.
    pub fn update_station(
        &self,
        station_id: &StationId,
        update: StationUpdate,
    ) -> Result<Station, KioskError> {
        if let Some(service_ids) = &update.service_ids {
            self.require_services(service_ids)?;
        }

        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(station) = state.stations.get_mut(station_id) else {
            return Err(KioskError::station_not_found(station_id.as_str()));
        };
        if let Some(name) = update.name {
            station.name = name;
        }
        if let Some(service_ids) = update.service_ids {
            station.service_ids = service_ids;
        }

        let station = station.clone();
        info!(station = %station_id, "station updated");
        state.commit(
            QueueEvent::StationUpdated {
                station: station.clone(),
            },
            self.clock.now(),
        );
        Ok(station)
    }

    /// Delete a station. Rejected while it is serving a ticket.
    pub fn remove_station(&self, station_id: &StationId) -> Result<Station, KioskError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        if state.station(station_id)?.is_busy() {
            return Err(KioskError::StationBusy {
                station_id: station_id.to_string(),
            });
        }
        let Some(station) = state.stations.remove(station_id) else {
            return Err(KioskError::station_not_found(station_id.as_str()));
        };

        info!(station = %station_id, "station removed");
        state.commit(
            QueueEvent::StationRemoved {
                station: station.clone(),
            },
            self.clock.now(),
        );
        Ok(station)
    }

    /// Drop finished tickets created before local date `before` from memory.
    ///
    /// Active tickets and anything from today are kept, so numbering is never
    /// affected. Persisted history is untouched. Returns the number dropped.
    pub fn prune_history(&self, before: NaiveDate) -> usize {
        let cutoff = before.min(self.clock.today());
        let mut state = self.lock();
        let initial = state.tickets.len();
        state.tickets.retain(|_, t| {
            !(t.status.is_terminal() && self.clock.local_date(t.created_at) < cutoff)
        });
        let pruned = initial - state.tickets.len();
        if pruned > 0 {
            debug!(pruned, %cutoff, "pruned finished tickets from memory");
        }
        pruned
    }

    /// Register a callback invoked after every accepted transition.
    ///
    /// Callbacks run on the transition's thread while the store is locked:
    /// they must return quickly and must not call back into the store.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let mut state = self.lock();
        state.next_subscription += 1;
        let id = SubscriptionId(state.next_subscription);
        state.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.lock();
        let before = state.subscribers.len();
        state.subscribers.retain(|(sid, _)| *sid != id);
        state.subscribers.len() != before
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.lock().snapshot)
    }

    pub fn ticket(&self, id: &TicketId) -> Option<Ticket> {
        self.lock().tickets.get(id).cloned()
    }

    pub fn station(&self, id: &StationId) -> Option<Station> {
        self.lock().stations.get(id).cloned()
    }

    pub fn services(&self) -> &ServiceCatalog {
        &self.catalog
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
