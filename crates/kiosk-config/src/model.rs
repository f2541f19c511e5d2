// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the kiosk queue system.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeSet;

use kiosk_core::{Service, ServiceCatalog, ServiceId, Station, StationStatus};
use serde::{Deserialize, Serialize};

/// Backend names accepted in `announce.backends`.
pub const SPEECH_BACKENDS: &[&str] = &["local", "remote", "log"];

/// Top-level kiosk configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KioskConfig {
    /// Site identity, logging, and local time settings.
    #[serde(default)]
    pub kiosk: GeneralConfig,

    /// Services offered at the kiosk, in display order.
    #[serde(default = "default_services")]
    pub services: Vec<ServiceConfig>,

    /// Stations created on first start if storage does not know them yet.
    #[serde(default)]
    pub stations: Vec<StationSeedConfig>,

    /// Persistence mirror settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Spoken announcement settings.
    #[serde(default)]
    pub announce: AnnounceConfig,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            kiosk: GeneralConfig::default(),
            services: default_services(),
            stations: Vec::new(),
            storage: StorageConfig::default(),
            announce: AnnounceConfig::default(),
        }
    }
}

impl KioskConfig {
    /// The configured services as the catalog the queue store validates against.
    pub fn service_catalog(&self) -> ServiceCatalog {
        ServiceCatalog::new(self.services.iter().map(ServiceConfig::to_service).collect())
    }
}

/// Site identity and process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Display name of the training center.
    #[serde(default = "default_site_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Minutes east of UTC used for the daily numbering reset.
    /// `None` uses the host's local time zone.
    #[serde(default)]
    pub utc_offset_minutes: Option<i32>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            log_level: default_log_level(),
            utc_offset_minutes: None,
        }
    }
}

fn default_site_name() -> String {
    "Training Center".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// One service offered at the kiosk.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    /// Ticket number prefix. Derived from `label` when unset.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl ServiceConfig {
    pub fn to_service(&self) -> Service {
        Service {
            id: ServiceId::new(self.id.clone()),
            label: self.label.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

fn default_services() -> Vec<ServiceConfig> {
    [
        ("enrollment", "Enrollment", "New and returning student enrollment"),
        ("payment", "Payment", "Tuition and fee payments"),
        ("records", "Records", "Certificates and transcript requests"),
    ]
    .into_iter()
    .map(|(id, label, description)| ServiceConfig {
        id: id.to_string(),
        label: label.to_string(),
        description: description.to_string(),
        icon: String::new(),
        prefix: None,
    })
    .collect()
}

/// A station to create on first start.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StationSeedConfig {
    pub id: String,
    pub name: String,
    /// Service ids this station may call. Empty means any service.
    #[serde(default)]
    pub services: Vec<String>,
    /// Start the station open instead of closed.
    #[serde(default)]
    pub open: bool,
}

impl StationSeedConfig {
    pub fn to_station(&self) -> Station {
        Station {
            id: self.id.as_str().into(),
            name: self.name.clone(),
            status: if self.open {
                StationStatus::Open
            } else {
                StationStatus::Closed
            },
            service_ids: self
                .services
                .iter()
                .map(|s| ServiceId::new(s.clone()))
                .collect::<BTreeSet<_>>(),
            current_ticket_id: None,
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,

    /// Days of finished tickets loaded back into memory at startup.
    /// Today's tickets are always loaded so numbering can resume.
    #[serde(default = "default_history_days")]
    pub history_days: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
            history_days: default_history_days(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("kiosk").join("kiosk.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("kiosk.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

fn default_history_days() -> u32 {
    1
}

/// Spoken announcement configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnnounceConfig {
    /// Speak "now serving" announcements when tickets are called.
    #[serde(default = "default_announce_enabled")]
    pub enabled: bool,

    /// Announcement text. `{ticket}` and `{station}` are substituted.
    #[serde(default = "default_template")]
    pub template: String,

    /// Pause between consecutive announcements, in milliseconds.
    #[serde(default = "default_gap_ms")]
    pub gap_ms: u64,

    /// Upper bound on one backend's playback before it counts as failed.
    #[serde(default = "default_playback_timeout_secs")]
    pub playback_timeout_secs: u64,

    /// Number of recent call keys remembered for de-duplication.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Seconds after which the de-duplication history is cleared.
    #[serde(default = "default_history_clear_secs")]
    pub history_clear_secs: u64,

    /// Backends tried in order for every announcement.
    #[serde(default = "default_backends")]
    pub backends: Vec<String>,

    /// Local speech program settings.
    #[serde(default)]
    pub local: LocalSpeechConfig,

    /// Remote speech service settings.
    #[serde(default)]
    pub remote: RemoteSpeechConfig,
}

impl Default for AnnounceConfig {
    fn default() -> Self {
        Self {
            enabled: default_announce_enabled(),
            template: default_template(),
            gap_ms: default_gap_ms(),
            playback_timeout_secs: default_playback_timeout_secs(),
            history_capacity: default_history_capacity(),
            history_clear_secs: default_history_clear_secs(),
            backends: default_backends(),
            local: LocalSpeechConfig::default(),
            remote: RemoteSpeechConfig::default(),
        }
    }
}

fn default_announce_enabled() -> bool {
    true
}

fn default_template() -> String {
    "Now serving ticket {ticket}. Please proceed to {station}.".to_string()
}

fn default_gap_ms() -> u64 {
    1500
}

fn default_playback_timeout_secs() -> u64 {
    20
}

fn default_history_capacity() -> usize {
    256
}

fn default_history_clear_secs() -> u64 {
    3600 // 1 hour
}

fn default_backends() -> Vec<String> {
    vec!["local".to_string(), "log".to_string()]
}

/// Local text-to-speech program invoked once per announcement.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LocalSpeechConfig {
    /// Program to run.
    #[serde(default = "default_local_program")]
    pub program: String,

    /// Arguments; `{text}` and `{voice}` are substituted.
    #[serde(default = "default_local_args")]
    pub args: Vec<String>,

    #[serde(default = "default_local_female_voice")]
    pub female_voice: String,

    #[serde(default = "default_local_male_voice")]
    pub male_voice: String,
}

impl Default for LocalSpeechConfig {
    fn default() -> Self {
        Self {
            program: default_local_program(),
            args: default_local_args(),
            female_voice: default_local_female_voice(),
            male_voice: default_local_male_voice(),
        }
    }
}

fn default_local_program() -> String {
    "espeak-ng".to_string()
}

fn default_local_args() -> Vec<String> {
    vec!["-v".to_string(), "{voice}".to_string(), "{text}".to_string()]
}

fn default_local_female_voice() -> String {
    "en+f3".to_string()
}

fn default_local_male_voice() -> String {
    "en+m3".to_string()
}

/// Remote text-to-speech service returning audio bytes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteSpeechConfig {
    /// Synthesis endpoint. `None` disables the remote backend.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token sent with each request.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_remote_female_voice")]
    pub female_voice: String,

    #[serde(default = "default_remote_male_voice")]
    pub male_voice: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Program that plays the returned audio from stdin.
    #[serde(default = "default_player_program")]
    pub player_program: String,

    #[serde(default = "default_player_args")]
    pub player_args: Vec<String>,
}

impl Default for RemoteSpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            female_voice: default_remote_female_voice(),
            male_voice: default_remote_male_voice(),
            request_timeout_secs: default_request_timeout_secs(),
            player_program: default_player_program(),
            player_args: default_player_args(),
        }
    }
}

fn default_remote_female_voice() -> String {
    "en-US-female".to_string()
}

fn default_remote_male_voice() -> String {
    "en-US-male".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_player_program() -> String {
    "aplay".to_string()
}

fn default_player_args() -> Vec<String> {
    vec!["-q".to_string(), "-".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_three_services() {
        let catalog = KioskConfig::default().service_catalog();
        assert_eq!(catalog.len(), 3);
        let enrollment = catalog.get(&ServiceId::new("enrollment")).unwrap();
        assert_eq!(enrollment.ticket_prefix(), "ENRO");
    }

    #[test]
    fn station_seed_converts_to_closed_station_by_default() {
        let seed = StationSeedConfig {
            id: "w1".into(),
            name: "Window 1".into(),
            services: vec!["payment".into()],
            open: false,
        };
        let station = seed.to_station();
        assert_eq!(station.status, StationStatus::Closed);
        assert!(station.serves(&ServiceId::new("payment")));
        assert!(!station.serves(&ServiceId::new("enrollment")));
        assert!(station.current_ticket_id.is_none());
    }

    #[test]
    fn user_services_replace_defaults() {
        let toml_str = r#"
[[services]]
id = "inquiry"
label = "General Inquiry"
"#;
        let config: KioskConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.services[0].id, "inquiry");
        assert!(config.services[0].prefix.is_none());
    }

    #[test]
    fn unknown_announce_key_is_rejected() {
        let toml_str = r#"
[announce]
gap_msec = 10
"#;
        assert!(toml::from_str::<KioskConfig>(toml_str).is_err());
    }
}
