// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed queries over the kiosk tables.
//!
//! The plain functions take a `rusqlite::Connection` so several of them can
//! share one transaction inside a single `call`; the async ones wrap a
//! single query for callers holding a [`Database`](crate::Database).

pub mod stations;
pub mod tickets;
