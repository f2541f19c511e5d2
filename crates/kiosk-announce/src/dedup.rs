// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded history of recently announced calls.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tokio::time::Instant;

use crate::announcement::AnnouncementKey;

/// Remembers up to `capacity` keys, evicting the oldest, and forgets all
/// of them once `clear_after` has passed since the last wholesale clear.
///
/// Keys of items still queued or playing are pending: they are rejected as
/// duplicates until [`RecentKeys::settle`] is called for them, whatever the
/// clear interval or capacity says.
#[derive(Debug)]
pub struct RecentKeys {
    capacity: usize,
    clear_after: Duration,
    order: VecDeque<AnnouncementKey>,
    seen: HashSet<AnnouncementKey>,
    pending: HashSet<AnnouncementKey>,
    cleared_at: Instant,
}

impl RecentKeys {
    pub fn new(capacity: usize, clear_after: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            clear_after,
            order: VecDeque::new(),
            seen: HashSet::new(),
            pending: HashSet::new(),
            cleared_at: Instant::now(),
        }
    }

    /// Record `key` as pending. Returns `false` if it was already recorded
    /// or is still pending.
    pub fn insert(&mut self, key: AnnouncementKey) -> bool {
        if self.cleared_at.elapsed() >= self.clear_after {
            self.order.clear();
            self.seen.clear();
            self.cleared_at = Instant::now();
        }

        if self.seen.contains(&key) || self.pending.contains(&key) {
            return false;
        }
        if self.order.len() >= self.capacity
            && let Some(oldest) = self.order.pop_front()
        {
            self.seen.remove(&oldest);
        }
        self.seen.insert(key.clone());
        self.pending.insert(key.clone());
        self.order.push_back(key);
        true
    }

    /// The item for `key` has played or been dropped.
    pub fn settle(&mut self, key: &AnnouncementKey) {
        self.pending.remove(key);
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
