// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row encoding for stations and tickets.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use kiosk_core::{ServiceId, Station, StationStatus, Ticket, TicketStatus};
use rusqlite::Row;
use rusqlite::types::Type;

/// Fixed-width UTC text, so stored timestamps compare in time order.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_err(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
}

fn timestamp(row: &Row<'_>, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_err(column, e))
}

fn optional_timestamp(row: &Row<'_>, column: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let text: Option<String> = row.get(column)?;
    text.map(|t| {
        DateTime::parse_from_rfc3339(&t)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_err(column, e))
    })
    .transpose()
}

/// `service_ids` column: a JSON array of service id strings.
pub fn encode_service_ids(ids: &BTreeSet<ServiceId>) -> Result<String, serde_json::Error> {
    serde_json::to_string(ids)
}

/// Columns: id, name, status, service_ids, current_ticket_id.
pub fn station_from_row(row: &Row<'_>) -> rusqlite::Result<Station> {
    let status: String = row.get(2)?;
    let service_ids: String = row.get(3)?;
    let current: Option<String> = row.get(4)?;
    Ok(Station {
        id: row.get::<_, String>(0)?.into(),
        name: row.get(1)?,
        status: StationStatus::from_str(&status).map_err(|e| conversion_err(2, e))?,
        service_ids: serde_json::from_str(&service_ids).map_err(|e| conversion_err(3, e))?,
        current_ticket_id: current.map(Into::into),
    })
}

/// Columns: id, ticket_number, service_id, status, created_at, served_by,
/// called_at, served_at.
pub fn ticket_from_row(row: &Row<'_>) -> rusqlite::Result<Ticket> {
    let status: String = row.get(3)?;
    let served_by: Option<String> = row.get(5)?;
    Ok(Ticket {
        id: row.get::<_, String>(0)?.into(),
        ticket_number: row.get(1)?,
        service: row.get::<_, String>(2)?.into(),
        status: TicketStatus::from_str(&status).map_err(|e| conversion_err(3, e))?,
        created_at: timestamp(row, 4)?,
        served_by: served_by.map(Into::into),
        called_at: optional_timestamp(row, 6)?,
        served_at: optional_timestamp(row, 7)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamps_are_fixed_width_and_sortable() {
        let a = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let b = a + chrono::TimeDelta::microseconds(1);
        let (ta, tb) = (format_timestamp(a), format_timestamp(b));
        assert_eq!(ta, "2026-03-02T09:00:00.000000Z");
        assert_eq!(ta.len(), tb.len());
        assert!(ta < tb);
    }

    #[test]
    fn service_ids_encode_as_json_array() {
        let ids: BTreeSet<ServiceId> = ["payment", "enrollment"]
            .into_iter()
            .map(ServiceId::new)
            .collect();
        assert_eq!(
            encode_service_ids(&ids).unwrap(),
            r#"["enrollment","payment"]"#
        );
        assert_eq!(encode_service_ids(&BTreeSet::new()).unwrap(), "[]");
    }
}
