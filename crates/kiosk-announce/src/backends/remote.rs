// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote text-to-speech: synthesize over HTTP, play the audio locally.
//!
//! The service receives `{"text": ..., "voice": ...}` and answers with raw
//! audio bytes, which are piped into a player program on stdin.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use kiosk_config::model::RemoteSpeechConfig;
use kiosk_core::{AdapterType, HealthStatus, KioskAdapter, KioskError, SpeechBackend, Voice};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::command::program_exists;

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    voice: &'a str,
}

/// HTTP speech synthesis with local playback.
#[derive(Debug, Clone)]
pub struct RemoteSpeech {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    female_voice: String,
    male_voice: String,
    player_program: String,
    player_args: Vec<String>,
}

impl RemoteSpeech {
    /// Build from configuration. Fails without an endpoint.
    pub fn new(config: &RemoteSpeechConfig) -> Result<Self, KioskError> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                KioskError::Config("announce.remote.endpoint is not set".to_string())
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| KioskError::Speech {
                backend: "remote".to_string(),
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            female_voice: config.female_voice.clone(),
            male_voice: config.male_voice.clone(),
            player_program: config.player_program.clone(),
            player_args: config.player_args.clone(),
        })
    }

    fn voice_id(&self, voice: Voice) -> &str {
        match voice {
            Voice::Female => &self.female_voice,
            Voice::Male => &self.male_voice,
        }
    }

    fn failure(
        &self,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> KioskError {
        KioskError::Speech {
            backend: self.name().to_string(),
            message,
            source,
        }
    }

    /// Request audio for `text` from the synthesis service.
    pub async fn synthesize(&self, text: &str, voice: Voice) -> Result<Vec<u8>, KioskError> {
        let mut request = self.client.post(&self.endpoint).json(&SynthesisRequest {
            text,
            voice: self.voice_id(voice),
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            self.failure(format!("HTTP request failed: {e}"), Some(Box::new(e)))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.failure(
                format!("synthesis service returned {status}: {}", body.trim()),
                None,
            ));
        }

        let audio = response.bytes().await.map_err(|e| {
            self.failure(format!("failed to read audio: {e}"), Some(Box::new(e)))
        })?;
        if audio.is_empty() {
            return Err(self.failure("synthesis service returned no audio".to_string(), None));
        }
        debug!(bytes = audio.len(), "synthesized announcement audio");
        Ok(audio.to_vec())
    }

    /// Feed `audio` to the player program and wait for it to finish.
    async fn play(&self, audio: &[u8]) -> Result<(), KioskError> {
        let mut child = Command::new(&self.player_program)
            .args(&self.player_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                self.failure(
                    format!("failed to run player `{}`: {e}", self.player_program),
                    Some(Box::new(e)),
                )
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(audio).await.map_err(|e| {
                self.failure(
                    format!("failed to stream audio to player: {e}"),
                    Some(Box::new(e)),
                )
            })?;
            // Dropping stdin signals end of audio.
        }

        let status = child.wait().await.map_err(|e| {
            self.failure(format!("player did not finish: {e}"), Some(Box::new(e)))
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(self.failure(
                format!("player `{}` exited with {status}", self.player_program),
                None,
            ))
        }
    }
}

#[async_trait]
impl KioskAdapter for RemoteSpeech {
    fn name(&self) -> &str {
        "remote"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Speech
    }

    async fn health_check(&self) -> Result<HealthStatus, KioskError> {
        if program_exists(&self.player_program) {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded(format!(
                "audio player `{}` not found",
                self.player_program
            )))
        }
    }
}

#[async_trait]
impl SpeechBackend for RemoteSpeech {
    async fn speak(&self, text: &str, voice: Voice) -> Result<(), KioskError> {
        let audio = self.synthesize(text, voice).await?;
        self.play(&audio).await
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(endpoint: &str, player: &str) -> RemoteSpeechConfig {
        RemoteSpeechConfig {
            endpoint: Some(endpoint.to_string()),
            api_key: Some("test-key".into()),
            player_program: player.to_string(),
            player_args: Vec::new(),
            ..RemoteSpeechConfig::default()
        }
    }

    #[test]
    fn requires_an_endpoint() {
        let err = RemoteSpeech::new(&RemoteSpeechConfig::default()).unwrap_err();
        assert!(matches!(err, KioskError::Config(_)));
    }

    #[tokio::test]
    async fn synthesize_posts_text_and_voice_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/speak"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_json(serde_json::json!({
                "text": "Ticket ENRO, 001",
                "voice": "en-US-male"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3, 4]))
            .expect(1)
            .mount(&server)
            .await;

        let speech =
            RemoteSpeech::new(&config(&format!("{}/speak", server.uri()), "cat")).unwrap();
        let audio = speech
            .synthesize("Ticket ENRO, 001", Voice::Male)
            .await
            .unwrap();
        assert_eq!(audio, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn quota_errors_are_backend_failures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
            .mount(&server)
            .await;

        let speech = RemoteSpeech::new(&config(&server.uri(), "cat")).unwrap();
        let err = speech.speak("hello", Voice::Female).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("429"), "{message}");
        assert!(message.contains("quota exceeded"), "{message}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn speak_pipes_audio_to_the_player() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 2048]))
            .mount(&server)
            .await;

        let speech = RemoteSpeech::new(&config(&server.uri(), "cat")).unwrap();
        speech.speak("hello", Voice::Female).await.unwrap();
    }
}
