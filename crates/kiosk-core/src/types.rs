// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Data model shared by the queue store, the storage mirror, and the
//! announcement dispatcher.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Prefix used when a service label yields no usable letters.
pub const FALLBACK_TICKET_PREFIX: &str = "TKT";

/// Number of label letters that form a derived ticket prefix.
const PREFIX_LEN: usize = 4;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Stable identifier of a service offered at the kiosk.
    ServiceId
);
string_id!(
    /// Unique identifier of a serving station.
    StationId
);
string_id!(
    /// Unique identifier of a ticket.
    TicketId
);

/// A named queue category offered at the kiosk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    /// Explicit ticket prefix; derived from the label when absent.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl Service {
    /// Display prefix for this service's ticket numbers.
    ///
    /// An explicit prefix wins; otherwise the first four letters of the
    /// label, whitespace stripped and uppercased. Falls back to `TKT`.
    pub fn ticket_prefix(&self) -> String {
        let source = self.prefix.as_deref().unwrap_or(&self.label);
        let derived: String = source
            .chars()
            .filter(|c| !c.is_whitespace())
            .take(PREFIX_LEN)
            .flat_map(char::to_uppercase)
            .collect();
        if derived.is_empty() {
            FALLBACK_TICKET_PREFIX.to_string()
        } else {
            derived
        }
    }
}

/// The set of services the kiosk offers, in display order.
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    services: Vec<Service>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<Service>) -> Self {
        Self { services }
    }

    pub fn get(&self, id: &ServiceId) -> Option<&Service> {
        self.services.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &ServiceId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Whether a station is accepting calls.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StationStatus {
    Open,
    Closed,
}

/// A physical or virtual serving point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub status: StationStatus,
    /// Services this station may call. Empty means unrestricted.
    #[serde(default)]
    pub service_ids: BTreeSet<ServiceId>,
    #[serde(default)]
    pub current_ticket_id: Option<TicketId>,
}

impl Station {
    /// A closed, idle station.
    pub fn new(id: impl Into<StationId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: StationStatus::Closed,
            service_ids: BTreeSet::new(),
            current_ticket_id: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == StationStatus::Open
    }

    pub fn is_busy(&self) -> bool {
        self.current_ticket_id.is_some()
    }

    /// Whether this station may call tickets of `service`.
    pub fn serves(&self, service: &ServiceId) -> bool {
        self.service_ids.is_empty() || self.service_ids.contains(service)
    }
}

/// Lifecycle state of a ticket.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TicketStatus {
    Waiting,
    Serving,
    Served,
    Skipped,
}

impl TicketStatus {
    /// Waiting or serving.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Waiting | Self::Serving)
    }

    /// Served or skipped; never changes again.
    pub fn is_terminal(self) -> bool {
        !self.is_active()
    }
}

/// One student's queued request for a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    /// Display string, `<PREFIX>-<seq>`.
    pub ticket_number: String,
    #[serde(rename = "type")]
    pub service: ServiceId,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub served_by: Option<StationId>,
    #[serde(default)]
    pub called_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub served_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Numeric suffix of the ticket number, if it has one.
    pub fn sequence(&self) -> Option<u32> {
        self.ticket_number
            .rsplit_once('-')
            .and_then(|(_, digits)| digits.parse().ok())
    }

    pub fn is_waiting_for(&self, service: &ServiceId) -> bool {
        self.status == TicketStatus::Waiting && &self.service == service
    }

    /// Whether this ticket is the one `station` is currently serving.
    pub fn is_served_by(&self, station: &StationId) -> bool {
        self.status == TicketStatus::Serving && self.served_by.as_ref() == Some(station)
    }
}

/// Voice used for one spoken announcement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Voice {
    Female,
    Male,
}

impl Voice {
    /// The other voice.
    pub fn toggled(self) -> Self {
        match self {
            Self::Female => Self::Male,
            Self::Male => Self::Female,
        }
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external collaborator an adapter stands in for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Speech,
    Storage,
}

/// Immutable view of the queue published after every accepted transition.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Incremented on every accepted transition.
    pub version: u64,
    pub taken_at: Option<DateTime<Utc>>,
    /// All stations, ordered by id.
    pub stations: Vec<Station>,
    /// Waiting and serving tickets, ordered by creation.
    pub active_tickets: Vec<Ticket>,
}

impl Snapshot {
    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.stations.iter().find(|s| &s.id == id)
    }

    /// Waiting tickets of `service` in the order they will be called.
    pub fn waiting<'a>(&'a self, service: &'a ServiceId) -> impl Iterator<Item = &'a Ticket> + 'a {
        self.active_tickets
            .iter()
            .filter(move |t| t.is_waiting_for(service))
    }

    pub fn waiting_count(&self, service: &ServiceId) -> usize {
        self.waiting(service).count()
    }

    /// Stations that are serving a ticket, paired with that ticket.
    pub fn now_serving(&self) -> Vec<(&Station, &Ticket)> {
        self.stations
            .iter()
            .filter_map(|station| {
                let current = station.current_ticket_id.as_ref()?;
                self.active_tickets
                    .iter()
                    .find(|t| &t.id == current)
                    .map(|ticket| (station, ticket))
            })
            .collect()
    }
}
