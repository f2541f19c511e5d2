// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily per-service ticket numbering.
//!
//! Numbers look like `ENRO-004`: the service prefix and a sequence that
//! restarts at 1 each local day. The next sequence is always derived from
//! the ticket history, never from a stored counter, so it survives restarts
//! as long as today's tickets are restored.

use chrono::NaiveDate;
use kiosk_core::{Clock, ServiceId, Ticket};
use tracing::warn;

/// Largest sequence that fits the zero-padded three-digit field.
pub const MAX_PADDED_SEQUENCE: u32 = 999;

/// Sequence for the next ticket of `service` issued on local date `today`.
pub fn next_sequence<'a>(
    tickets: impl IntoIterator<Item = &'a Ticket>,
    service: &ServiceId,
    today: NaiveDate,
    clock: &dyn Clock,
) -> u32 {
    tickets
        .into_iter()
        .filter(|t| &t.service == service && clock.local_date(t.created_at) == today)
        .filter_map(Ticket::sequence)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

/// Format `<PREFIX>-<seq>` with the sequence zero-padded to three digits.
///
/// Past 999 the field widens (`ENRO-1000`); numbers are never truncated.
pub fn format_ticket_number(prefix: &str, sequence: u32) -> String {
    if sequence > MAX_PADDED_SEQUENCE {
        warn!(
            prefix,
            sequence, "daily ticket sequence exceeded three digits"
        );
    }
    format!("{prefix}-{sequence:03}")
}
