// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend that writes announcements to the log instead of speaking them.

use async_trait::async_trait;
use kiosk_core::{AdapterType, HealthStatus, KioskAdapter, KioskError, SpeechBackend, Voice};
use tracing::info;

/// Always succeeds. Useful as a last resort on machines without audio.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSpeech;

#[async_trait]
impl KioskAdapter for LogSpeech {
    fn name(&self) -> &str {
        "log"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Speech
    }

    async fn health_check(&self) -> Result<HealthStatus, KioskError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SpeechBackend for LogSpeech {
    async fn speak(&self, text: &str, voice: Voice) -> Result<(), KioskError> {
        info!(%voice, "ANNOUNCE: {text}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn writes_the_text_to_the_log() {
        LogSpeech.speak("Now serving ENRO, 001", Voice::Male).await.unwrap();
        assert!(logs_contain("ANNOUNCE: Now serving ENRO, 001"));
    }
}
