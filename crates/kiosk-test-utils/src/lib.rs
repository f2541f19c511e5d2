// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for kiosk integration tests.
//!
//! Provides fakes for the kiosk's collaborators so queue, announcement, and
//! wiring tests run deterministically without audio hardware or a database.
//!
//! # Components
//!
//! - [`ManualClock`] - Clock that only moves when told to
//! - [`MockSpeech`] - Speech backend that records, fails, or hangs on demand
//! - [`MemoryStorage`] - In-memory `QueueStorage` with injectable write failures
//! - [`StoreHarness`] - Queue store wired to a manual clock and an event log

pub mod clock;
pub mod harness;
pub mod mock_speech;
pub mod mock_storage;

pub use clock::ManualClock;
pub use harness::{StoreHarness, StoreHarnessBuilder};
pub use mock_speech::{MockSpeech, SpeechBehavior};
pub use mock_storage::MemoryStorage;
