// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue events: one record per accepted store transition.
//!
//! Each event carries the post-transition value of every entity it changed,
//! so a persistence mirror can write it without reading the store back.

use serde::Serialize;

use crate::types::{Station, StationId, Ticket};

/// An accepted transition of the queue store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueueEvent {
    TicketIssued { ticket: Ticket },
    TicketCalled { ticket: Ticket, station: Station },
    TicketCompleted { ticket: Ticket, station: Station },
    TicketSkipped { ticket: Ticket, station: Station },
    /// A serving ticket returned to the queue because its station closed
    /// or the pairing was found inconsistent on restore.
    TicketReleased { ticket: Ticket, station: Option<Station> },
    StationOpened { station: Station },
    /// The station closed; `released` is the ticket it was serving, if any.
    StationClosed {
        station: Station,
        released: Option<Ticket>,
    },
    StationAdded { station: Station },
    StationUpdated { station: Station },
    StationRemoved { station: Station },
}

impl QueueEvent {
    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TicketIssued { .. } => "ticket_issued",
            Self::TicketCalled { .. } => "ticket_called",
            Self::TicketCompleted { .. } => "ticket_completed",
            Self::TicketSkipped { .. } => "ticket_skipped",
            Self::TicketReleased { .. } => "ticket_released",
            Self::StationOpened { .. } => "station_opened",
            Self::StationClosed { .. } => "station_closed",
            Self::StationAdded { .. } => "station_added",
            Self::StationUpdated { .. } => "station_updated",
            Self::StationRemoved { .. } => "station_removed",
        }
    }

    /// Tickets whose stored value must be replaced.
    pub fn changed_tickets(&self) -> Vec<&Ticket> {
        match self {
            Self::TicketIssued { ticket }
            | Self::TicketCalled { ticket, .. }
            | Self::TicketCompleted { ticket, .. }
            | Self::TicketSkipped { ticket, .. }
            | Self::TicketReleased { ticket, .. } => vec![ticket],
            Self::StationClosed { released, .. } => released.iter().collect(),
            Self::StationOpened { .. }
            | Self::StationAdded { .. }
            | Self::StationUpdated { .. }
            | Self::StationRemoved { .. } => Vec::new(),
        }
    }

    /// Stations whose stored value must be replaced.
    pub fn changed_stations(&self) -> Vec<&Station> {
        match self {
            Self::TicketIssued { .. } | Self::StationRemoved { .. } => Vec::new(),
            Self::TicketReleased { station, .. } => station.iter().collect(),
            Self::TicketCalled { station, .. }
            | Self::TicketCompleted { station, .. }
            | Self::TicketSkipped { station, .. }
            | Self::StationOpened { station }
            | Self::StationClosed { station, .. }
            | Self::StationAdded { station }
            | Self::StationUpdated { station } => vec![station],
        }
    }

    /// The station deleted by this event, if any.
    pub fn removed_station(&self) -> Option<&StationId> {
        match self {
            Self::StationRemoved { station } => Some(&station.id),
            _ => None,
        }
    }
}
