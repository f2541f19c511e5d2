// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock speech backend for deterministic announcement tests.
//!
//! `MockSpeech` implements `SpeechBackend`, records every utterance it is
//! asked to play, and tracks how many plays overlap so tests can assert that
//! announcements never talk over each other.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use kiosk_core::{AdapterType, HealthStatus, KioskAdapter, KioskError, SpeechBackend, Voice};

/// How the mock responds to `speak`.
#[derive(Debug, Clone)]
pub enum SpeechBehavior {
    /// Play for the configured duration, then succeed.
    Succeed,
    /// Fail immediately with this message.
    Fail(String),
    /// Never finish; relies on the caller's timeout or cancellation.
    Hang,
}

/// A speech backend that records what it was asked to say.
pub struct MockSpeech {
    name: String,
    behavior: Mutex<SpeechBehavior>,
    play_time: Duration,
    spoken: Arc<Mutex<Vec<(String, Voice)>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    attempts: AtomicUsize,
}

impl MockSpeech {
    /// A backend that succeeds instantly.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behavior: Mutex::new(SpeechBehavior::Succeed),
            play_time: Duration::ZERO,
            spoken: Arc::new(Mutex::new(Vec::new())),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            attempts: AtomicUsize::new(0),
        }
    }

    /// A backend that always fails.
    pub fn failing(name: impl Into<String>) -> Self {
        Self::new(name).with_behavior(SpeechBehavior::Fail("mock failure".to_string()))
    }

    /// A backend that never completes.
    pub fn hanging(name: impl Into<String>) -> Self {
        Self::new(name).with_behavior(SpeechBehavior::Hang)
    }

    pub fn with_behavior(self, behavior: SpeechBehavior) -> Self {
        *self.behavior.lock().unwrap() = behavior;
        self
    }

    /// Make each successful play take `play_time` (tokio time).
    pub fn with_play_time(mut self, play_time: Duration) -> Self {
        self.play_time = play_time;
        self
    }

    pub fn set_behavior(&self, behavior: SpeechBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Utterances that completed successfully, in order.
    pub fn spoken(&self) -> Vec<(String, Voice)> {
        self.spoken.lock().unwrap().clone()
    }

    /// Number of `speak` calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Largest number of overlapping `speak` calls observed.
    pub fn max_concurrent(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl KioskAdapter for MockSpeech {
    fn name(&self) -> &str {
        &self.name
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Speech
    }

    async fn health_check(&self) -> Result<HealthStatus, KioskError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl SpeechBackend for MockSpeech {
    async fn speak(&self, text: &str, voice: Voice) -> Result<(), KioskError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let now_playing = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_playing, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            SpeechBehavior::Succeed => {
                if !self.play_time.is_zero() {
                    tokio::time::sleep(self.play_time).await;
                }
                self.spoken.lock().unwrap().push((text.to_string(), voice));
                Ok(())
            }
            SpeechBehavior::Fail(message) => Err(KioskError::Speech {
                backend: self.name.clone(),
                message,
                source: None,
            }),
            SpeechBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_successful_utterances() {
        let speech = MockSpeech::new("mock");
        speech.speak("hello", Voice::Female).await.unwrap();
        assert_eq!(speech.spoken(), vec![("hello".to_string(), Voice::Female)]);
        assert_eq!(speech.attempts(), 1);
        assert_eq!(speech.max_concurrent(), 1);
    }

    #[tokio::test]
    async fn failing_backend_records_nothing() {
        let speech = MockSpeech::failing("broken");
        let err = speech.speak("hello", Voice::Male).await.unwrap_err();
        assert!(matches!(err, KioskError::Speech { ref backend, .. } if backend == "broken"));
        assert!(speech.spoken().is_empty());
        assert_eq!(speech.attempts(), 1);
    }
}
