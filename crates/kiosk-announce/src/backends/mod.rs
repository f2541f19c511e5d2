// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Speech backend implementations.

pub mod command;
pub mod log;
pub mod remote;

use std::sync::Arc;

use kiosk_config::model::AnnounceConfig;
use kiosk_core::{KioskError, SpeechBackend};

pub use command::CommandSpeech;
pub use log::LogSpeech;
pub use remote::RemoteSpeech;

/// Instantiate the configured backends in priority order.
///
/// Names are validated with the configuration; an unknown name here is an
/// internal error.
pub fn build_backends(config: &AnnounceConfig) -> Result<Vec<Arc<dyn SpeechBackend>>, KioskError> {
    config
        .backends
        .iter()
        .map(|name| -> Result<Arc<dyn SpeechBackend>, KioskError> {
            match name.as_str() {
                "local" => Ok(Arc::new(CommandSpeech::new(&config.local))),
                "remote" => Ok(Arc::new(RemoteSpeech::new(&config.remote)?)),
                "log" => Ok(Arc::new(LogSpeech)),
                other => Err(KioskError::Config(format!(
                    "unknown speech backend `{other}`"
                ))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_backends_in_configured_order() {
        let mut config = AnnounceConfig::default();
        config.backends = vec!["log".into(), "local".into()];
        let backends = build_backends(&config).unwrap();
        let names: Vec<&str> = backends.iter().map(|b| b.name()).collect();
        assert_eq!(names, vec!["log", "local"]);
    }

    #[test]
    fn remote_without_endpoint_is_a_config_error() {
        let mut config = AnnounceConfig::default();
        config.backends = vec!["remote".into()];
        assert!(matches!(
            build_backends(&config),
            Err(KioskError::Config(_))
        ));
    }
}
