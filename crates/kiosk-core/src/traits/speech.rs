// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech backend trait for spoken "now serving" announcements.

use async_trait::async_trait;

use crate::error::KioskError;
use crate::traits::adapter::KioskAdapter;
use crate::types::Voice;

/// One way of turning announcement text into audible speech.
///
/// The dispatcher holds an ordered list of backends and tries them in turn,
/// so each implementation only has to report success or failure for a
/// single utterance. `speak` resolves once playback has finished.
#[async_trait]
pub trait SpeechBackend: KioskAdapter {
    async fn speak(&self, text: &str, voice: Voice) -> Result<(), KioskError>;
}
