// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spoken "now serving" announcements.
//!
//! The [`AnnouncementDispatcher`] turns ticket-called events into a single
//! FIFO playback queue: duplicates are dropped, voices alternate, only one
//! announcement plays at a time, and each item tries the configured speech
//! backends in order until one succeeds.

pub mod announcement;
pub mod backends;
pub mod dedup;
pub mod dispatcher;

pub use announcement::{Announcement, AnnouncementKey};
pub use backends::{CommandSpeech, LogSpeech, RemoteSpeech, build_backends};
pub use dedup::RecentKeys;
pub use dispatcher::{
    AnnouncementDispatcher, DispatcherHandle, DispatcherSettings, EnqueueOutcome,
    PlaybackOutcome, PlaybackResult,
};
