// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! First-come, first-served call order.

use std::cmp::Ordering;

use kiosk_core::{ServiceId, Ticket};

/// Queue order: creation time, then id as a tie-breaker.
pub fn queue_order(a: &Ticket, b: &Ticket) -> Ordering {
    a.created_at
        .cmp(&b.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// The waiting ticket of `service` that should be called next.
///
/// Whether the calling station may call at all is checked by the store.
pub fn select_next<'a>(
    tickets: impl IntoIterator<Item = &'a Ticket>,
    service: &ServiceId,
) -> Option<&'a Ticket> {
    tickets
        .into_iter()
        .filter(|t| t.is_waiting_for(service))
        .min_by(|a, b| queue_order(a, b))
}

/// Waiting tickets of `service` in call order.
pub fn waiting_in_order<'a>(
    tickets: impl IntoIterator<Item = &'a Ticket>,
    service: &ServiceId,
) -> Vec<&'a Ticket> {
    let mut waiting: Vec<&Ticket> = tickets
        .into_iter()
        .filter(|t| t.is_waiting_for(service))
        .collect();
    waiting.sort_by(|a, b| queue_order(a, b));
    waiting
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};
    use kiosk_core::{TicketId, TicketStatus};

    use super::*;

    fn ticket(id: &str, service: &str, minute: i64, status: TicketStatus) -> Ticket {
        let base = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        Ticket {
            id: TicketId::new(id),
            ticket_number: id.to_uppercase(),
            service: ServiceId::new(service),
            status,
            created_at: base + TimeDelta::minutes(minute),
            served_by: None,
            called_at: None,
            served_at: None,
        }
    }

    #[test]
    fn oldest_waiting_ticket_wins() {
        let tickets = vec![
            ticket("b", "payment", 5, TicketStatus::Waiting),
            ticket("a", "payment", 2, TicketStatus::Waiting),
            ticket("c", "payment", 9, TicketStatus::Waiting),
        ];
        let next = select_next(&tickets, &ServiceId::new("payment")).unwrap();
        assert_eq!(next.id.as_str(), "a");
    }

    #[test]
    fn ignores_other_services_and_non_waiting() {
        let tickets = vec![
            ticket("a", "payment", 1, TicketStatus::Serving),
            ticket("b", "payment", 2, TicketStatus::Skipped),
            ticket("c", "enrollment", 0, TicketStatus::Waiting),
            ticket("d", "payment", 3, TicketStatus::Waiting),
        ];
        let next = select_next(&tickets, &ServiceId::new("payment")).unwrap();
        assert_eq!(next.id.as_str(), "d");
        assert!(select_next(&tickets, &ServiceId::new("records")).is_none());
    }

    #[test]
    fn equal_timestamps_break_ties_by_id() {
        let tickets = vec![
            ticket("zz", "payment", 4, TicketStatus::Waiting),
            ticket("aa", "payment", 4, TicketStatus::Waiting),
        ];
        let next = select_next(&tickets, &ServiceId::new("payment")).unwrap();
        assert_eq!(next.id.as_str(), "aa");
    }

    #[test]
    fn waiting_in_order_sorts_by_creation() {
        let tickets = vec![
            ticket("c", "payment", 30, TicketStatus::Waiting),
            ticket("a", "payment", 10, TicketStatus::Waiting),
            ticket("b", "payment", 20, TicketStatus::Waiting),
        ];
        let ids: Vec<&str> = waiting_in_order(&tickets, &ServiceId::new("payment"))
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
