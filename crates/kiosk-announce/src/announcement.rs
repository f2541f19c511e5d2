// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! What gets announced.

use chrono::{DateTime, Utc};
use kiosk_core::QueueEvent;
use serde::Serialize;

/// One "ticket X, please proceed to station Y" announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    pub ticket_number: String,
    pub station_name: String,
    pub called_at: DateTime<Utc>,
}

/// Identity of one call. Replays of the same call share a key; calling the
/// same ticket again after a re-queue does not.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnnouncementKey {
    pub ticket_number: String,
    pub called_at: DateTime<Utc>,
}

impl Announcement {
    /// Build the announcement for a `TicketCalled` event.
    pub fn from_event(event: &QueueEvent) -> Option<Self> {
        let QueueEvent::TicketCalled { ticket, station } = event else {
            return None;
        };
        Some(Self {
            ticket_number: ticket.ticket_number.clone(),
            station_name: station.name.clone(),
            called_at: ticket.called_at?,
        })
    }

    pub fn key(&self) -> AnnouncementKey {
        AnnouncementKey {
            ticket_number: self.ticket_number.clone(),
            called_at: self.called_at,
        }
    }

    /// Fill `{ticket}` and `{station}` in `template`.
    ///
    /// The ticket number is spoken with its dash as a pause, so
    /// `ENRO-004` reads as "ENRO, 004".
    pub fn render(&self, template: &str) -> String {
        template
            .replace("{ticket}", &self.ticket_number.replace('-', ", "))
            .replace("{station}", &self.station_name)
    }
}

#[cfg(test)]
mod tests {
    use kiosk_core::{ServiceId, Station, StationStatus, Ticket, TicketId, TicketStatus};

    use super::*;

    fn called_event() -> QueueEvent {
        let now = Utc::now();
        let mut station = Station::new("w1", "Window 1");
        station.status = StationStatus::Open;
        QueueEvent::TicketCalled {
            ticket: Ticket {
                id: TicketId::new("t1"),
                ticket_number: "ENRO-004".into(),
                service: ServiceId::new("enrollment"),
                status: TicketStatus::Serving,
                created_at: now,
                served_by: Some(station.id.clone()),
                called_at: Some(now),
                served_at: None,
            },
            station,
        }
    }

    #[test]
    fn builds_from_called_event_only() {
        let announcement = Announcement::from_event(&called_event()).unwrap();
        assert_eq!(announcement.ticket_number, "ENRO-004");
        assert_eq!(announcement.station_name, "Window 1");

        let opened = QueueEvent::StationOpened {
            station: Station::new("w1", "Window 1"),
        };
        assert!(Announcement::from_event(&opened).is_none());
    }

    #[test]
    fn renders_template() {
        let announcement = Announcement::from_event(&called_event()).unwrap();
        assert_eq!(
            announcement.render("Ticket {ticket} to {station}."),
            "Ticket ENRO, 004 to Window 1."
        );
    }
}
