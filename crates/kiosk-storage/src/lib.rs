// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence mirror for the kiosk queue system.
//!
//! The in-memory queue store is authoritative while the process runs.
//! This crate keeps a durable copy of its stations and tickets so numbering
//! and in-flight service survive a restart: WAL-mode SQLite with embedded
//! migrations, a single writer via `tokio-rusqlite`, and a background task
//! that applies queue events in order.

pub mod adapter;
pub mod database;
pub mod lock;
pub mod migrations;
pub mod mirror;
pub mod models;
pub mod queries;

use chrono::{DateTime, Days, Utc};
use kiosk_core::Clock;

pub use adapter::SqliteStorage;
pub use database::Database;
pub use lock::SiteLock;
pub use mirror::{MirrorStats, spawn_mirror};

/// Earliest creation time loaded back at startup.
///
/// Covers `history_days` local calendar days ending today; today is always
/// included so ticket numbering can resume.
pub fn history_since(clock: &dyn Clock, history_days: u32) -> DateTime<Utc> {
    let today = clock.today();
    let first_day = today
        .checked_sub_days(Days::new(u64::from(history_days.saturating_sub(1))))
        .unwrap_or(today);
    clock.start_of_day(first_day)
}
