// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local text-to-speech through an external program such as `espeak-ng`.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use kiosk_config::model::LocalSpeechConfig;
use kiosk_core::{AdapterType, HealthStatus, KioskAdapter, KioskError, SpeechBackend, Voice};
use tokio::process::Command;
use tracing::debug;

/// Runs `program args...` once per announcement, substituting `{text}` and
/// `{voice}` in the arguments. A non-zero exit is a failure.
#[derive(Debug, Clone)]
pub struct CommandSpeech {
    program: String,
    args: Vec<String>,
    female_voice: String,
    male_voice: String,
}

impl CommandSpeech {
    pub fn new(config: &LocalSpeechConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            female_voice: config.female_voice.clone(),
            male_voice: config.male_voice.clone(),
        }
    }

    fn voice_id(&self, voice: Voice) -> &str {
        match voice {
            Voice::Female => &self.female_voice,
            Voice::Male => &self.male_voice,
        }
    }

    fn render_args(&self, text: &str, voice: Voice) -> Vec<String> {
        let voice_id = self.voice_id(voice);
        self.args
            .iter()
            .map(|arg| arg.replace("{text}", text).replace("{voice}", voice_id))
            .collect()
    }

    fn failure(&self, message: String, source: Option<std::io::Error>) -> KioskError {
        KioskError::Speech {
            backend: self.name().to_string(),
            message,
            source: source.map(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>),
        }
    }
}

/// Whether `program` resolves to a file, directly or via `PATH`.
pub(crate) fn program_exists(program: &str) -> bool {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

#[async_trait]
impl KioskAdapter for CommandSpeech {
    fn name(&self) -> &str {
        "local"
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Speech
    }

    async fn health_check(&self) -> Result<HealthStatus, KioskError> {
        if program_exists(&self.program) {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy(format!(
                "speech program `{}` not found",
                self.program
            )))
        }
    }
}

#[async_trait]
impl SpeechBackend for CommandSpeech {
    async fn speak(&self, text: &str, voice: Voice) -> Result<(), KioskError> {
        let args = self.render_args(text, voice);
        debug!(program = %self.program, ?args, "running speech program");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| self.failure(format!("failed to run `{}`: {e}", self.program), Some(e)))?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(self.failure(
                format!("`{}` exited with {}: {}", self.program, output.status, stderr.trim()),
                None,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speech(program: &str, args: &[&str]) -> CommandSpeech {
        CommandSpeech::new(&LocalSpeechConfig {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            female_voice: "en+f3".into(),
            male_voice: "en+m3".into(),
        })
    }

    #[test]
    fn substitutes_text_and_voice() {
        let speech = speech("espeak-ng", &["-v", "{voice}", "{text}"]);
        assert_eq!(
            speech.render_args("Ticket ENRO, 001", Voice::Male),
            vec!["-v", "en+m3", "Ticket ENRO, 001"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn zero_exit_is_success() {
        speech("sh", &["-c", "exit 0", "{text}"])
            .speak("hello", Voice::Female)
            .await
            .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_reports_stderr() {
        let err = speech("sh", &["-c", "echo no audio device >&2; exit 3"])
            .speak("hello", Voice::Female)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("no audio device"), "{message}");
        assert!(matches!(err, KioskError::Speech { ref backend, .. } if backend == "local"));
    }

    #[tokio::test]
    async fn missing_program_fails_and_is_unhealthy() {
        let speech = speech("definitely-not-a-speech-program", &["{text}"]);
        assert!(speech.speak("hello", Voice::Female).await.is_err());
        assert!(matches!(
            speech.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }
}
