// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the queue store: day rollover, restart recovery,
//! concurrency, and queue-wide invariants.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{NaiveDate, TimeDelta, TimeZone, Utc};
use kiosk_core::{
    Clock, KioskError, QueueEvent, ServiceId, Snapshot, StationId, StationStatus, TicketStatus,
};
use kiosk_queue::QueueStore;
use kiosk_test_utils::{ManualClock, StoreHarness};
use proptest::prelude::*;

fn enrollment() -> ServiceId {
    ServiceId::new("enrollment")
}

/// Station/ticket pairing must be mutual, and no station may serve while closed.
fn assert_consistent(snapshot: &Snapshot) {
    for station in &snapshot.stations {
        if let Some(current) = &station.current_ticket_id {
            assert_eq!(station.status, StationStatus::Open, "closed station serving");
            let ticket = snapshot
                .active_tickets
                .iter()
                .find(|t| &t.id == current)
                .expect("station points at a missing ticket");
            assert!(ticket.is_served_by(&station.id));
        }
    }
    for ticket in &snapshot.active_tickets {
        if ticket.status == TicketStatus::Serving {
            let by = ticket.served_by.as_ref().expect("serving without station");
            let station = snapshot.station(by).expect("served by missing station");
            assert_eq!(station.current_ticket_id.as_ref(), Some(&ticket.id));
        } else {
            assert!(ticket.served_by.is_none());
        }
    }
}

#[test]
fn numbering_restarts_after_local_midnight() {
    let h = StoreHarness::builder().build();
    h.store.issue_ticket(&enrollment()).unwrap();
    let second = h.store.issue_ticket(&enrollment()).unwrap();
    assert_eq!(second.ticket_number, "ENRO-002");

    h.advance(TimeDelta::days(1));
    let next_day = h.store.issue_ticket(&enrollment()).unwrap();
    assert_eq!(next_day.ticket_number, "ENRO-001");
}

#[test]
fn day_boundary_uses_configured_offset() {
    // 15:30 UTC is 23:30 in UTC+8; forty minutes later it is a new local day.
    let h = StoreHarness::builder()
        .starting_at(Utc.with_ymd_and_hms(2026, 3, 2, 15, 30, 0).unwrap())
        .with_utc_offset_minutes(8 * 60)
        .build();
    h.store.issue_ticket(&enrollment()).unwrap();
    h.store.issue_ticket(&enrollment()).unwrap();
    h.advance(TimeDelta::minutes(40));
    let after_midnight = h.store.issue_ticket(&enrollment()).unwrap();
    assert_eq!(after_midnight.ticket_number, "ENRO-001");
}

#[test]
fn restore_resumes_numbering_from_history() {
    let h = StoreHarness::builder().with_open_station("w1").build();
    for _ in 0..4 {
        h.store.issue_ticket(&enrollment()).unwrap();
    }
    let w1 = StationId::new("w1");
    h.store.call_next(&w1, &enrollment()).unwrap();
    h.store.complete_ticket(&w1).unwrap();

    // Replay the published events the way the storage mirror would.
    let mut persisted = HashMap::new();
    for event in h.events() {
        for ticket in event.changed_tickets() {
            persisted.insert(ticket.id.clone(), ticket.clone());
        }
    }

    let clock = Arc::new(ManualClock::new(h.clock.now() + TimeDelta::minutes(10)));
    let (restored, repairs) = QueueStore::restore(
        h.store.services().clone(),
        clock,
        h.store.snapshot().stations.clone(),
        persisted.into_values().collect(),
    );
    assert!(repairs.is_empty());
    let next = restored.issue_ticket(&enrollment()).unwrap();
    assert_eq!(next.ticket_number, "ENRO-005");
}

#[test]
fn restore_repairs_inconsistent_pairings() {
    let h = StoreHarness::builder()
        .with_open_station("w1")
        .with_open_station("w2")
        .build();
    h.store.issue_ticket(&enrollment()).unwrap();
    h.store.issue_ticket(&enrollment()).unwrap();
    let w1 = StationId::new("w1");
    let w2 = StationId::new("w2");
    let serving = h.store.call_next(&w1, &enrollment()).unwrap().unwrap();

    let snapshot = h.store.snapshot();
    let mut stations = snapshot.stations.clone();
    // w1 "forgot" its ticket; w2 claims a waiting one.
    let waiting_id = snapshot
        .waiting(&enrollment())
        .next()
        .map(|t| t.id.clone())
        .unwrap();
    for station in &mut stations {
        if station.id == w1 {
            station.current_ticket_id = None;
        } else if station.id == w2 {
            station.current_ticket_id = Some(waiting_id.clone());
        }
    }

    let (restored, repairs) = QueueStore::restore(
        h.store.services().clone(),
        h.clock.clone(),
        stations,
        snapshot.active_tickets.clone(),
    );

    assert_eq!(repairs.len(), 2);
    assert!(repairs.iter().any(|e| matches!(
        e,
        QueueEvent::StationUpdated { station } if station.id == w2 && station.current_ticket_id.is_none()
    )));
    assert!(repairs.iter().any(|e| matches!(
        e,
        QueueEvent::TicketReleased { ticket, .. } if ticket.id == serving.id && ticket.status == TicketStatus::Waiting
    )));
    assert_consistent(&restored.snapshot());

    // The released ticket keeps its original place in line.
    let next = restored.call_next(&w2, &enrollment()).unwrap().unwrap();
    assert_eq!(next.id, serving.id);
}

#[test]
fn restore_releases_ticket_held_by_closed_station() {
    let h = StoreHarness::builder().with_open_station("w1").build();
    let w1 = StationId::new("w1");
    h.store.issue_ticket(&enrollment()).unwrap();
    h.store.call_next(&w1, &enrollment()).unwrap();

    let snapshot = h.store.snapshot();
    let mut stations = snapshot.stations.clone();
    stations[0].status = StationStatus::Closed;

    let (restored, repairs) = QueueStore::restore(
        h.store.services().clone(),
        h.clock.clone(),
        stations,
        snapshot.active_tickets.clone(),
    );
    assert_eq!(repairs.len(), 2);
    let snapshot = restored.snapshot();
    assert_consistent(&snapshot);
    assert_eq!(snapshot.waiting_count(&enrollment()), 1);
}

#[test]
fn prune_keeps_active_tickets_and_today() {
    let h = StoreHarness::builder()
        .with_open_station("w1")
        .with_open_station("w2")
        .build();
    let w1 = StationId::new("w1");
    let w2 = StationId::new("w2");
    let served = h.store.issue_ticket(&enrollment()).unwrap();
    let skipped = h.store.issue_ticket(&enrollment()).unwrap();
    let carried_over = h.store.issue_ticket(&enrollment()).unwrap();
    h.store.call_next(&w1, &enrollment()).unwrap();
    h.store.complete_ticket(&w1).unwrap();
    h.store.call_next(&w1, &enrollment()).unwrap();
    h.store.skip_ticket(&w1).unwrap();

    h.advance(TimeDelta::days(1));
    let todays = h.store.issue_ticket(&enrollment()).unwrap();
    // Yesterday's leftover is still first in line.
    let called = h.store.call_next(&w1, &enrollment()).unwrap().unwrap();
    assert_eq!(called.id, carried_over.id);
    h.store.call_next(&w2, &enrollment()).unwrap();
    h.store.complete_ticket(&w2).unwrap();

    // A cutoff in the future is capped at today.
    let pruned = h
        .store
        .prune_history(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
    assert_eq!(pruned, 2);
    assert!(h.store.ticket(&served.id).is_none());
    assert!(h.store.ticket(&skipped.id).is_none());
    assert!(h.store.ticket(&carried_over.id).is_some());
    assert!(h.store.ticket(&todays.id).is_some());

    let next = h.store.issue_ticket(&enrollment()).unwrap();
    assert_eq!(next.ticket_number, "ENRO-002");
}

#[test]
fn concurrent_calls_never_claim_the_same_ticket() {
    let h = StoreHarness::builder()
        .with_open_station("w1")
        .with_open_station("w2")
        .build();
    for _ in 0..200 {
        h.store.issue_ticket(&enrollment()).unwrap();
    }

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["w1", "w2"]
        .into_iter()
        .map(|id| {
            let store = Arc::clone(&h.store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let station = StationId::new(id);
                let mut claimed = Vec::new();
                barrier.wait();
                while let Some(ticket) = store.call_next(&station, &enrollment()).unwrap() {
                    claimed.push(ticket.id);
                    store.complete_ticket(&station).unwrap();
                }
                claimed
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.join().unwrap());
    }
    let unique: HashSet<_> = all.iter().cloned().collect();
    assert_eq!(all.len(), 200);
    assert_eq!(unique.len(), 200);
}

#[test]
fn concurrent_close_and_complete_leave_state_consistent() {
    for _ in 0..50 {
        let h = StoreHarness::builder().with_open_station("w1").build();
        let w1 = StationId::new("w1");
        h.store.issue_ticket(&enrollment()).unwrap();
        h.store.call_next(&w1, &enrollment()).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let closer = {
            let store = Arc::clone(&h.store);
            let barrier = Arc::clone(&barrier);
            let w1 = w1.clone();
            thread::spawn(move || {
                barrier.wait();
                store.set_station_status(&w1, StationStatus::Closed)
            })
        };
        barrier.wait();
        let completed = h.store.complete_ticket(&w1);
        let closed = closer.join().unwrap();
        assert!(closed.is_ok());

        let snapshot = h.store.snapshot();
        assert_consistent(&snapshot);
        match completed {
            // Completed first: nothing left to release.
            Ok(ticket) => {
                assert_eq!(ticket.status, TicketStatus::Served);
                assert_eq!(snapshot.waiting_count(&enrollment()), 0);
            }
            // Closed first: the ticket went back to the queue.
            Err(KioskError::NotFound { .. }) => {
                assert_eq!(snapshot.waiting_count(&enrollment()), 1);
            }
            Err(other) => panic!("unexpected error {other}"),
        }
    }
}

#[derive(Debug, Clone)]
enum Op {
    Issue(usize),
    Call(usize, usize),
    Complete(usize),
    Skip(usize),
    Toggle(usize),
    Tick(i64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0..3usize).prop_map(Op::Issue),
        3 => (0..3usize, 0..3usize).prop_map(|(s, v)| Op::Call(s, v)),
        1 => (0..3usize).prop_map(Op::Complete),
        1 => (0..3usize).prop_map(Op::Skip),
        1 => (0..3usize).prop_map(Op::Toggle),
        1 => (0..60i64).prop_map(Op::Tick),
    ]
}

proptest! {
    #[test]
    fn arbitrary_sequences_preserve_invariants(ops in proptest::collection::vec(op(), 1..120)) {
        let h = StoreHarness::builder()
            .with_open_station("s0")
            .with_station("s1", &["payment"], true)
            .with_station("s2", &[], false)
            .build();
        let services = [ServiceId::new("enrollment"), ServiceId::new("payment"), ServiceId::new("records")];
        let stations = [StationId::new("s0"), StationId::new("s1"), StationId::new("s2")];

        let mut issued: Vec<kiosk_core::Ticket> = Vec::new();
        let mut called_per_service: HashMap<ServiceId, Vec<kiosk_core::TicketId>> = HashMap::new();
        let mut finished: HashSet<kiosk_core::TicketId> = HashSet::new();

        for op in ops {
            match op {
                Op::Issue(s) => issued.push(h.store.issue_ticket(&services[s]).unwrap()),
                Op::Call(st, s) => {
                    if let Ok(Some(t)) = h.store.call_next(&stations[st], &services[s]) {
                        // Served and skipped tickets never come back.
                        prop_assert!(
                            !finished.contains(&t.id),
                            "{} called again after it was served or skipped",
                            t.ticket_number
                        );
                        called_per_service.entry(t.service.clone()).or_default().push(t.id);
                    }
                }
                Op::Complete(st) => {
                    if let Ok(t) = h.store.complete_ticket(&stations[st]) {
                        finished.insert(t.id);
                    }
                }
                Op::Skip(st) => {
                    if let Ok(t) = h.store.skip_ticket(&stations[st]) {
                        finished.insert(t.id);
                    }
                }
                Op::Toggle(st) => {
                    let current = h.store.station(&stations[st]).unwrap().status;
                    let next = match current {
                        StationStatus::Open => StationStatus::Closed,
                        StationStatus::Closed => StationStatus::Open,
                    };
                    h.store.set_station_status(&stations[st], next).unwrap();
                }
                Op::Tick(secs) => h.advance(TimeDelta::seconds(secs)),
            }
            assert_consistent(&h.store.snapshot());
        }

        // Numbers are unique and creation order matches issuance order.
        let numbers: HashSet<&str> = issued.iter().map(|t| t.ticket_number.as_str()).collect();
        prop_assert_eq!(numbers.len(), issued.len());
        for pair in issued.windows(2) {
            prop_assert!(pair[0].created_at < pair[1].created_at);
        }

        for id in &finished {
            let ticket = h.store.ticket(id).unwrap();
            prop_assert!(ticket.status.is_terminal());
        }

        // Per service, sequences within a day are exactly 1..=n.
        for service in &services {
            let seqs: Vec<u32> = issued
                .iter()
                .filter(|t| &t.service == service)
                .filter_map(|t| t.sequence())
                .collect();
            for (i, seq) in seqs.iter().enumerate() {
                prop_assert_eq!(*seq as usize, i + 1);
            }
        }

        // First calls per service follow issuance order (re-queued tickets
        // are the only ones that can be called twice).
        for (service, called) in &called_per_service {
            let mut seen = HashSet::new();
            let first_calls: Vec<_> = called.iter().filter(|id| seen.insert((*id).clone())).collect();
            let order: Vec<_> = issued
                .iter()
                .filter(|t| &t.service == service)
                .map(|t| &t.id)
                .filter(|id| first_calls.contains(id))
                .collect();
            prop_assert_eq!(first_calls, order);
        }
    }
}
