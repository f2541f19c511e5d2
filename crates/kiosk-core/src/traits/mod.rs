// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits at the seams between the queue core and its external
//! collaborators (speech output, persistence).
//!
//! All adapters extend [`KioskAdapter`] and use `#[async_trait]` for
//! dynamic dispatch compatibility.

pub mod adapter;
pub mod speech;
pub mod storage;

pub use adapter::KioskAdapter;
pub use speech::SpeechBackend;
pub use storage::{QueueStorage, StoredQueue};
