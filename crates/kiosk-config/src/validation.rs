// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints serde attributes cannot express: unique
//! service and station ids, seed stations naming known services, sane
//! timeouts, and a usable speech backend list.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::{KioskConfig, SPEECH_BACKENDS};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Largest UTC offset in use anywhere (UTC+14), in minutes.
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &KioskConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    validate_general(config, &mut errors);
    let service_ids = validate_services(config, &mut errors);
    validate_stations(config, &service_ids, &mut errors);
    validate_announce(config, &mut errors);

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_general(config: &KioskConfig, errors: &mut Vec<ConfigError>) {
    let level = config.kiosk.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "kiosk.log_level `{}` must be one of: {}",
            config.kiosk.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if let Some(offset) = config.kiosk.utc_offset_minutes
        && offset.abs() > MAX_UTC_OFFSET_MINUTES
    {
        errors.push(ConfigError::validation(format!(
            "kiosk.utc_offset_minutes must be within ±{MAX_UTC_OFFSET_MINUTES}, got {offset}"
        )));
    }
}

/// Returns the set of service ids for cross-checking stations.
fn validate_services<'a>(
    config: &'a KioskConfig,
    errors: &mut Vec<ConfigError>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for (i, service) in config.services.iter().enumerate() {
        if service.id.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "services[{i}].id must not be empty"
            )));
            continue;
        }
        if service.label.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "services[{i}].label must not be empty"
            )));
        }
        if !seen.insert(service.id.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate service id `{}` in [[services]]",
                service.id
            )));
        }
    }
    seen
}

fn validate_stations(
    config: &KioskConfig,
    service_ids: &HashSet<&str>,
    errors: &mut Vec<ConfigError>,
) {
    let mut seen = HashSet::new();
    for (i, station) in config.stations.iter().enumerate() {
        if station.id.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "stations[{i}].id must not be empty"
            )));
            continue;
        }
        if !seen.insert(station.id.as_str()) {
            errors.push(ConfigError::validation(format!(
                "duplicate station id `{}` in [[stations]]",
                station.id
            )));
        }
        for service in &station.services {
            if !service_ids.contains(service.as_str()) {
                errors.push(ConfigError::validation(format!(
                    "station `{}` lists unknown service `{service}`",
                    station.id
                )));
            }
        }
    }
}

fn validate_announce(config: &KioskConfig, errors: &mut Vec<ConfigError>) {
    let announce = &config.announce;

    if announce.playback_timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "announce.playback_timeout_secs must be at least 1",
        ));
    }
    if announce.history_capacity == 0 {
        errors.push(ConfigError::validation(
            "announce.history_capacity must be at least 1",
        ));
    }
    if announce.history_clear_secs == 0 {
        errors.push(ConfigError::validation(
            "announce.history_clear_secs must be at least 1",
        ));
    }

    if !announce.enabled {
        return;
    }

    if announce.template.trim().is_empty() {
        errors.push(ConfigError::validation("announce.template must not be empty"));
    }
    if announce.backends.is_empty() {
        errors.push(ConfigError::validation(
            "announce.backends must list at least one backend when announcements are enabled",
        ));
    }

    let mut seen = HashSet::new();
    for backend in &announce.backends {
        if !SPEECH_BACKENDS.contains(&backend.as_str()) {
            errors.push(ConfigError::validation(format!(
                "announce.backends: unknown backend `{backend}` (expected one of: {})",
                SPEECH_BACKENDS.join(", ")
            )));
        }
        if !seen.insert(backend.as_str()) {
            errors.push(ConfigError::validation(format!(
                "announce.backends lists `{backend}` more than once"
            )));
        }
    }

    if seen.contains("local") && announce.local.program.trim().is_empty() {
        errors.push(ConfigError::validation(
            "announce.local.program must not be empty when the local backend is enabled",
        ));
    }
    if seen.contains("remote") {
        let endpoint_missing = announce
            .remote
            .endpoint
            .as_deref()
            .is_none_or(|e| e.trim().is_empty());
        if endpoint_missing {
            errors.push(ConfigError::validation(
                "announce.remote.endpoint is required when the remote backend is enabled",
            ));
        }
        if announce.remote.request_timeout_secs == 0 {
            errors.push(ConfigError::validation(
                "announce.remote.request_timeout_secs must be at least 1",
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StationSeedConfig;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&KioskConfig::default()).is_ok());
    }

    #[test]
    fn duplicate_service_ids_fail_validation() {
        let mut config = KioskConfig::default();
        let dup = config.services[0].clone();
        config.services.push(dup);
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "duplicate service id `enrollment`"));
    }

    #[test]
    fn station_with_unknown_service_fails_validation() {
        let mut config = KioskConfig::default();
        config.stations.push(StationSeedConfig {
            id: "w1".into(),
            name: "Window 1".into(),
            services: vec!["parking".into()],
            open: false,
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "unknown service `parking`"));
    }

    #[test]
    fn remote_backend_requires_endpoint() {
        let mut config = KioskConfig::default();
        config.announce.backends = vec!["local".into(), "remote".into()];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "announce.remote.endpoint"));

        config.announce.remote.endpoint = Some("https://tts.example.test/v1/speak".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn unknown_backend_and_zero_timeout_are_both_reported() {
        let mut config = KioskConfig::default();
        config.announce.backends = vec!["carrier-pigeon".into()];
        config.announce.playback_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(has_error(&errors, "carrier-pigeon"));
        assert!(has_error(&errors, "playback_timeout_secs"));
    }

    #[test]
    fn disabled_announcements_skip_backend_checks() {
        let mut config = KioskConfig::default();
        config.announce.enabled = false;
        config.announce.backends.clear();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn bad_log_level_and_offset_fail_validation() {
        let mut config = KioskConfig::default();
        config.kiosk.log_level = "loud".into();
        config.kiosk.utc_offset_minutes = Some(15 * 60);
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "kiosk.log_level"));
        assert!(has_error(&errors, "utc_offset_minutes"));
    }
}
