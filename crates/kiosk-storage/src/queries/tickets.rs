// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ticket rows.

use chrono::{DateTime, Utc};
use kiosk_core::{KioskError, Ticket, TicketId};
use rusqlite::{Connection, OptionalExtension, params};

use crate::database::Database;
use crate::models::{format_timestamp, ticket_from_row};

const TICKET_COLUMNS: &str =
    "id, ticket_number, service_id, status, created_at, served_by, called_at, served_at";

/// Insert or replace a ticket.
pub fn upsert(conn: &Connection, ticket: &Ticket) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO tickets (id, ticket_number, service_id, status, created_at,
                              served_by, called_at, served_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
            ticket_number = excluded.ticket_number,
            service_id = excluded.service_id,
            status = excluded.status,
            created_at = excluded.created_at,
            served_by = excluded.served_by,
            called_at = excluded.called_at,
            served_at = excluded.served_at",
        params![
            ticket.id.as_str(),
            ticket.ticket_number,
            ticket.service.as_str(),
            ticket.status.to_string(),
            format_timestamp(ticket.created_at),
            ticket.served_by.as_ref().map(|s| s.as_str()),
            ticket.called_at.map(format_timestamp),
            ticket.served_at.map(format_timestamp),
        ],
    )?;
    Ok(())
}

/// Tickets still waiting or serving, plus every ticket created at or after
/// `since`, oldest first.
pub fn active_or_since(conn: &Connection, since: DateTime<Utc>) -> rusqlite::Result<Vec<Ticket>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TICKET_COLUMNS} FROM tickets
         WHERE status IN ('waiting', 'serving') OR created_at >= ?1
         ORDER BY created_at ASC, id ASC"
    ))?;
    let rows = stmt.query_map(params![format_timestamp(since)], ticket_from_row)?;
    rows.collect()
}

/// Look up a single ticket.
pub async fn get_ticket(db: &Database, id: &TicketId) -> Result<Option<Ticket>, KioskError> {
    let id = id.as_str().to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Ticket>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1"),
                params![id],
                ticket_from_row,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Number of stored tickets, finished ones included.
pub async fn count_tickets(db: &Database) -> Result<i64, KioskError> {
    db.connection()
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))
        })
        .await
        .map_err(crate::database::map_tr_err)
}
