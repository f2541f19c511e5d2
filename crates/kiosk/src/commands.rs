// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue actions shared by the station console and the one-shot CLI
//! commands.

use std::collections::BTreeSet;
use std::sync::Arc;

use colored::Colorize;
use kiosk_config::KioskConfig;
use kiosk_core::{KioskError, ServiceId, Snapshot, Station, StationId, StationStatus, Ticket};
use kiosk_queue::{NewStation, QueueStore};
use tracing::debug;

use crate::display;
use crate::runtime::{EventRecorder, QueueRuntime, persist};

/// One operation against the queue store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Issue {
        service: ServiceId,
    },
    Call {
        station: StationId,
        service: ServiceId,
    },
    Complete {
        station: StationId,
    },
    Skip {
        station: StationId,
    },
    SetStatus {
        station: StationId,
        status: StationStatus,
    },
    AddStation {
        id: StationId,
        name: String,
        services: BTreeSet<ServiceId>,
        open: bool,
    },
    RemoveStation {
        station: StationId,
    },
    Status,
}

/// What an [`Action`] produced.
#[derive(Debug, Clone)]
pub enum Outcome {
    Issued(Ticket),
    Called {
        station: StationId,
        service: ServiceId,
        ticket: Option<Ticket>,
    },
    Completed(Ticket),
    Skipped(Ticket),
    StationChanged(Station),
    StationRemoved(Station),
    Status(Arc<Snapshot>),
}

/// Run `action` against `store`.
pub fn execute(store: &QueueStore, action: Action) -> Result<Outcome, KioskError> {
    debug!(?action, "executing action");
    match action {
        Action::Issue { service } => store.issue_ticket(&service).map(Outcome::Issued),
        Action::Call { station, service } => {
            let ticket = store.call_next(&station, &service)?;
            Ok(Outcome::Called {
                station,
                service,
                ticket,
            })
        }
        Action::Complete { station } => store.complete_ticket(&station).map(Outcome::Completed),
        Action::Skip { station } => store.skip_ticket(&station).map(Outcome::Skipped),
        Action::SetStatus { station, status } => store
            .set_station_status(&station, status)
            .map(Outcome::StationChanged),
        Action::AddStation {
            id,
            name,
            services,
            open,
        } => store
            .add_station(NewStation {
                id,
                name,
                service_ids: services,
                open,
            })
            .map(Outcome::StationChanged),
        Action::RemoveStation { station } => {
            store.remove_station(&station).map(Outcome::StationRemoved)
        }
        Action::Status => Ok(Outcome::Status(store.snapshot())),
    }
}

/// One line (or block, for status) describing `outcome`.
pub fn render(outcome: &Outcome, store: &QueueStore, use_color: bool) -> String {
    let paint = |text: String| -> String {
        if use_color {
            text.green().bold().to_string()
        } else {
            text
        }
    };
    match outcome {
        Outcome::Issued(ticket) => {
            let label = service_label(store, &ticket.service);
            format!("issued {} for {label}", paint(ticket.ticket_number.clone()))
        }
        Outcome::Called {
            station,
            ticket: Some(ticket),
            ..
        } => format!(
            "{} now serving {}",
            station_name(store, station),
            paint(ticket.ticket_number.clone())
        ),
        Outcome::Called {
            station,
            service,
            ticket: None,
        } => {
            let line = format!(
                "no {} tickets waiting for {}",
                service_label(store, service),
                station_name(store, station)
            );
            if use_color {
                line.dimmed().to_string()
            } else {
                line
            }
        }
        Outcome::Completed(ticket) => format!("{} served", ticket.ticket_number),
        Outcome::Skipped(ticket) => format!("{} skipped", ticket.ticket_number),
        Outcome::StationChanged(station) => {
            format!("{} ({}) is {}", station.name, station.id, station.status)
        }
        Outcome::StationRemoved(station) => {
            format!("removed station {} ({})", station.name, station.id)
        }
        Outcome::Status(snapshot) => display::render_status(snapshot, store.services(), use_color),
    }
}

fn service_label(store: &QueueStore, id: &ServiceId) -> String {
    store
        .services()
        .get(id)
        .map(|s| s.label.clone())
        .unwrap_or_else(|| id.to_string())
}

fn station_name(store: &QueueStore, id: &StationId) -> String {
    store
        .station(id)
        .map(|s| s.name)
        .unwrap_or_else(|| id.to_string())
}

/// Run one action outside the console: restore from storage, execute,
/// persist the resulting events, print the outcome.
pub async fn run_oneshot(config: &KioskConfig, action: Action, json: bool) -> Result<(), KioskError> {
    let runtime = QueueRuntime::open(config).await?;
    let recorder = EventRecorder::attach(&runtime.store);
    let result = execute(&runtime.store, action);
    let events = recorder.finish(&runtime.store);
    persist(runtime.storage.as_ref(), &events).await?;
    runtime.close().await?;

    let outcome = result?;
    if json {
        let value = match &outcome {
            Outcome::Status(snapshot) => {
                display::status_json(snapshot, &config.kiosk.name, runtime.store.services())
            }
            other => display::outcome_json(other),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        println!("{}", render(&outcome, &runtime.store, display::use_color()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use kiosk_core::TicketStatus;
    use kiosk_test_utils::StoreHarness;

    use super::*;

    fn harness() -> StoreHarness {
        StoreHarness::builder()
            .with_station("w1", &["enrollment"], true)
            .build()
    }

    #[test]
    fn issue_then_call_then_complete() {
        let h = harness();
        let enrollment = ServiceId::new("enrollment");
        let w1 = StationId::new("w1");

        let Outcome::Issued(ticket) = execute(
            &h.store,
            Action::Issue {
                service: enrollment.clone(),
            },
        )
        .unwrap() else {
            panic!("expected Issued");
        };
        assert_eq!(ticket.ticket_number, "ENRO-001");

        let called = execute(
            &h.store,
            Action::Call {
                station: w1.clone(),
                service: enrollment,
            },
        )
        .unwrap();
        assert!(matches!(called, Outcome::Called { ticket: Some(_), .. }));
        assert_eq!(
            render(&called, &h.store, false),
            "Station w1 now serving ENRO-001"
        );

        let Outcome::Completed(done) = execute(&h.store, Action::Complete { station: w1 }).unwrap()
        else {
            panic!("expected Completed");
        };
        assert_eq!(done.status, TicketStatus::Served);
    }

    #[test]
    fn empty_queue_is_informational() {
        let h = harness();
        let outcome = execute(
            &h.store,
            Action::Call {
                station: StationId::new("w1"),
                service: ServiceId::new("enrollment"),
            },
        )
        .unwrap();
        assert_eq!(
            render(&outcome, &h.store, false),
            "no Enrollment tickets waiting for Station w1"
        );
    }

    #[test]
    fn rejections_surface_as_errors() {
        let h = harness();
        let err = execute(
            &h.store,
            Action::Call {
                station: StationId::new("w1"),
                service: ServiceId::new("payment"),
            },
        )
        .unwrap_err();
        assert!(matches!(err, KioskError::ServiceNotOffered { .. }));
        assert!(err.is_user_facing());
    }

    #[test]
    fn station_admin_round_trip() {
        let h = harness();
        let added = execute(
            &h.store,
            Action::AddStation {
                id: StationId::new("w9"),
                name: "Window 9".into(),
                services: BTreeSet::new(),
                open: false,
            },
        )
        .unwrap();
        assert_eq!(render(&added, &h.store, false), "Window 9 (w9) is closed");

        let removed = execute(
            &h.store,
            Action::RemoveStation {
                station: StationId::new("w9"),
            },
        )
        .unwrap();
        assert_eq!(
            render(&removed, &h.store, false),
            "removed station Window 9 (w9)"
        );
        assert!(h.store.station(&StationId::new("w9")).is_none());
    }
}
