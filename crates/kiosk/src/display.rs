// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status output: the text table for terminals and `--json` for scripts.

use std::io::IsTerminal;

use colored::Colorize;
use kiosk_core::{ServiceCatalog, Snapshot, Station, Ticket};
use serde::Serialize;
use serde_json::Value;

use crate::commands::Outcome;

/// Colors only when stdout is a terminal.
pub fn use_color() -> bool {
    std::io::stdout().is_terminal()
}

/// Structured status for `kiosk status --json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport<'a> {
    pub site: &'a str,
    pub version: u64,
    pub services: Vec<ServiceQueue<'a>>,
    pub now_serving: Vec<ServingEntry<'a>>,
    pub stations: &'a [Station],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceQueue<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub waiting: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServingEntry<'a> {
    pub station: &'a str,
    pub station_name: &'a str,
    pub ticket: &'a Ticket,
}

pub fn status_report<'a>(
    snapshot: &'a Snapshot,
    site: &'a str,
    catalog: &'a ServiceCatalog,
) -> StatusReport<'a> {
    StatusReport {
        site,
        version: snapshot.version,
        services: catalog
            .iter()
            .map(|service| ServiceQueue {
                id: service.id.as_str(),
                label: &service.label,
                waiting: snapshot
                    .waiting(&service.id)
                    .map(|t| t.ticket_number.as_str())
                    .collect(),
            })
            .collect(),
        now_serving: snapshot
            .now_serving()
            .into_iter()
            .map(|(station, ticket)| ServingEntry {
                station: station.id.as_str(),
                station_name: &station.name,
                ticket,
            })
            .collect(),
        stations: &snapshot.stations,
    }
}

pub fn status_json(snapshot: &Snapshot, site: &str, catalog: &ServiceCatalog) -> Value {
    serde_json::to_value(status_report(snapshot, site, catalog)).unwrap_or(Value::Null)
}

/// JSON for the non-status outcomes.
pub fn outcome_json(outcome: &Outcome) -> Value {
    match outcome {
        Outcome::Issued(ticket) => serde_json::json!({ "issued": ticket }),
        Outcome::Called { station, service, ticket } => serde_json::json!({
            "called": ticket,
            "station": station,
            "service": service,
        }),
        Outcome::Completed(ticket) => serde_json::json!({ "completed": ticket }),
        Outcome::Skipped(ticket) => serde_json::json!({ "skipped": ticket }),
        Outcome::StationChanged(station) => serde_json::json!({ "station": station }),
        Outcome::StationRemoved(station) => serde_json::json!({ "removed": station }),
        Outcome::Status(snapshot) => serde_json::json!({ "version": snapshot.version }),
    }
}

/// Multi-line status block for the console and `kiosk status`.
pub fn render_status(snapshot: &Snapshot, catalog: &ServiceCatalog, use_color: bool) -> String {
    let mut out = String::new();
    let heading = |text: &str| -> String {
        if use_color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    };

    out.push_str(&format!("  {}\n", heading("Now serving")));
    let serving = snapshot.now_serving();
    if serving.is_empty() {
        out.push_str("    (nobody)\n");
    }
    for (station, ticket) in serving {
        let number = if use_color {
            ticket.ticket_number.green().bold().to_string()
        } else {
            ticket.ticket_number.clone()
        };
        out.push_str(&format!("    {:<16} {number}\n", station.name));
    }

    out.push_str(&format!("  {}\n", heading("Waiting")));
    for service in catalog.iter() {
        let waiting: Vec<&str> = snapshot
            .waiting(&service.id)
            .map(|t| t.ticket_number.as_str())
            .collect();
        let list = if waiting.is_empty() {
            "-".to_string()
        } else {
            waiting.join(" ")
        };
        out.push_str(&format!(
            "    {:<16} {:>3}  {list}\n",
            service.label,
            waiting.len()
        ));
    }

    out.push_str(&format!("  {}\n", heading("Stations")));
    if snapshot.stations.is_empty() {
        out.push_str("    (none configured)\n");
    }
    for station in &snapshot.stations {
        let status = match (station.is_open(), use_color) {
            (true, true) => "open".green().to_string(),
            (false, true) => "closed".red().to_string(),
            (true, false) => "open".to_string(),
            (false, false) => "closed".to_string(),
        };
        let services = if station.service_ids.is_empty() {
            "all services".to_string()
        } else {
            station
                .service_ids
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(",")
        };
        // Padded outside the escape codes so columns line up.
        let pad = " ".repeat(6usize.saturating_sub(station.status.to_string().len()));
        let status = format!("{status}{pad}");
        out.push_str(&format!(
            "    {:<8} {:<16} {status} {services}\n",
            station.id.as_str(),
            station.name
        ));
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use kiosk_core::{ServiceId, StationId};
    use kiosk_test_utils::StoreHarness;

    use super::*;

    #[test]
    fn plain_status_lists_serving_waiting_and_stations() {
        let h = StoreHarness::builder()
            .with_station("w1", &["enrollment"], true)
            .with_station("w2", &[], false)
            .build();
        let enrollment = ServiceId::new("enrollment");
        for _ in 0..3 {
            h.store.issue_ticket(&enrollment).unwrap();
        }
        h.store
            .call_next(&StationId::new("w1"), &enrollment)
            .unwrap();

        let text = render_status(&h.store.snapshot(), h.store.services(), false);
        assert!(text.contains("Station w1       ENRO-001"), "{text}");
        assert!(text.contains("Enrollment         2  ENRO-002 ENRO-003"), "{text}");
        assert!(text.contains("Payment            0  -"), "{text}");
        assert!(text.contains("w2       Station w2       closed all services"), "{text}");
    }

    #[test]
    fn json_report_has_waiting_numbers_in_order() {
        let h = StoreHarness::builder().with_open_station("w1").build();
        let payment = ServiceId::new("payment");
        h.store.issue_ticket(&payment).unwrap();
        h.store.issue_ticket(&payment).unwrap();

        let value = status_json(&h.store.snapshot(), "Main Campus", h.store.services());
        assert_eq!(value["site"], "Main Campus");
        let payment_queue = value["services"]
            .as_array()
            .unwrap()
            .iter()
            .find(|s| s["id"] == "payment")
            .unwrap();
        assert_eq!(
            payment_queue["waiting"],
            serde_json::json!(["PAYM-001", "PAYM-002"])
        );
        assert_eq!(value["nowServing"], serde_json::json!([]));
    }

    #[test]
    fn issued_outcome_json_carries_the_ticket() {
        let h = StoreHarness::builder().build();
        let ticket = h.store.issue_ticket(&ServiceId::new("records")).unwrap();
        let value = outcome_json(&Outcome::Issued(ticket));
        assert_eq!(value["issued"]["ticketNumber"], "RECO-001");
        assert_eq!(value["issued"]["type"], "records");
    }
}
