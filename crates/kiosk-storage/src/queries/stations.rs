// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Station rows.

use kiosk_core::{KioskError, Station, StationId};
use rusqlite::{Connection, OptionalExtension, params};

use crate::database::Database;
use crate::models::{encode_service_ids, station_from_row};

const STATION_COLUMNS: &str = "id, name, status, service_ids, current_ticket_id";

/// Insert or replace a station.
pub fn upsert(conn: &Connection, station: &Station) -> rusqlite::Result<()> {
    let service_ids = encode_service_ids(&station.service_ids)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
    conn.execute(
        "INSERT INTO stations (id, name, status, service_ids, current_ticket_id, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            status = excluded.status,
            service_ids = excluded.service_ids,
            current_ticket_id = excluded.current_ticket_id,
            updated_at = excluded.updated_at",
        params![
            station.id.as_str(),
            station.name,
            station.status.to_string(),
            service_ids,
            station.current_ticket_id.as_ref().map(|t| t.as_str()),
        ],
    )?;
    Ok(())
}

/// Delete a station. Returns whether a row existed.
pub fn delete(conn: &Connection, id: &StationId) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM stations WHERE id = ?1", params![id.as_str()])?;
    Ok(rows > 0)
}

/// Every station, ordered by id.
pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Station>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STATION_COLUMNS} FROM stations ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map([], station_from_row)?;
    rows.collect()
}

/// Look up a single station.
pub async fn get_station(db: &Database, id: &StationId) -> Result<Option<Station>, KioskError> {
    let id = id.as_str().to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Station>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {STATION_COLUMNS} FROM stations WHERE id = ?1"),
                params![id],
                station_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Every station, ordered by id.
pub async fn list_stations(db: &Database) -> Result<Vec<Station>, KioskError> {
    db.connection()
        .call(|conn| -> Result<Vec<Station>, rusqlite::Error> { list(conn) })
        .await
        .map_err(crate::database::map_tr_err)
}
