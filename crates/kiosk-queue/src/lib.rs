// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory queue state for the kiosk.
//!
//! [`QueueStore`] owns every station and ticket and is the single authority
//! for transitions. Numbering ([`issuance`]) and call order ([`selection`])
//! are pure functions over the store's ticket history.

pub mod issuance;
pub mod selection;
pub mod store;

pub use store::{NewStation, Notification, QueueStore, StationUpdate, SubscriptionId};
