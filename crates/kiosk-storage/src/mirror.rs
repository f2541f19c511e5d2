// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background task that writes queue events to storage in order.
//!
//! The queue store publishes events synchronously under its lock, so the
//! subscriber only pushes onto an unbounded channel and this task does the
//! I/O. A failed write is logged and skipped; the in-memory store stays
//! authoritative.

use std::sync::Arc;

use kiosk_core::{QueueEvent, QueueStorage};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Counts reported when the mirror task finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorStats {
    pub applied: usize,
    pub failed: usize,
}

/// Start the mirror task.
///
/// The task ends when every sender is dropped and the channel is empty, or
/// when `cancel` fires. On cancellation, events already in the channel are
/// still written before the task returns.
pub fn spawn_mirror(
    storage: Arc<dyn QueueStorage>,
    mut rx: mpsc::UnboundedReceiver<QueueEvent>,
    cancel: CancellationToken,
) -> JoinHandle<MirrorStats> {
    tokio::spawn(async move {
        let mut stats = MirrorStats::default();
        info!(storage = storage.name(), "storage mirror started");

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };
            write(storage.as_ref(), &event, &mut stats).await;
        }

        rx.close();
        while let Ok(event) = rx.try_recv() {
            write(storage.as_ref(), &event, &mut stats).await;
        }

        info!(
            applied = stats.applied,
            failed = stats.failed,
            "storage mirror stopped"
        );
        stats
    })
}

async fn write(storage: &dyn QueueStorage, event: &QueueEvent, stats: &mut MirrorStats) {
    match storage.apply(event).await {
        Ok(()) => {
            stats.applied += 1;
            debug!(kind = event.kind(), "event mirrored");
        }
        Err(e) => {
            stats.failed += 1;
            warn!(kind = event.kind(), error = %e, "failed to mirror queue event; continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use kiosk_core::Station;
    use kiosk_test_utils::MemoryStorage;

    use super::*;

    fn added(id: &str) -> QueueEvent {
        QueueEvent::StationAdded {
            station: Station::new(id, id.to_uppercase()),
        }
    }

    #[tokio::test]
    async fn applies_events_until_senders_drop() {
        let storage = Arc::new(MemoryStorage::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let task = spawn_mirror(storage.clone(), rx, CancellationToken::new());

        tx.send(added("w1")).unwrap();
        tx.send(added("w2")).unwrap();
        drop(tx);

        let stats = task.await.unwrap();
        assert_eq!(stats, MirrorStats { applied: 2, failed: 0 });
        assert!(storage.station(&"w2".into()).is_some());
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn write_failures_are_logged_and_skipped() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_fail_writes(true);
        let (tx, rx) = mpsc::unbounded_channel();
        let task = spawn_mirror(storage.clone(), rx, CancellationToken::new());

        tx.send(added("w1")).unwrap();
        drop(tx);

        let stats = task.await.unwrap();
        assert_eq!(stats.failed, 1);
        assert!(logs_contain("failed to mirror queue event"));
    }

    #[tokio::test]
    async fn cancellation_still_writes_queued_events() {
        let storage = Arc::new(MemoryStorage::new());
        let (tx, rx) = mpsc::unbounded_channel();
        for id in ["w1", "w2", "w3"] {
            tx.send(added(id)).unwrap();
        }
        let cancel = CancellationToken::new();
        cancel.cancel();

        let stats = spawn_mirror(storage.clone(), rx, cancel).await.unwrap();
        assert_eq!(stats.applied, 3);
        assert_eq!(storage.applied(), 3);
        // The sender is still alive but the task has exited.
        assert!(tx.send(added("w4")).is_err());
    }
}
