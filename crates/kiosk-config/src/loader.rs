// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./kiosk.toml` > `~/.config/kiosk/kiosk.toml` > `/etc/kiosk/kiosk.toml`
//! with environment variable overrides via `KIOSK_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::KioskConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/kiosk/kiosk.toml";

/// Configuration file in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "kiosk.toml";

/// Per-user configuration file under the XDG config directory.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("kiosk").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/kiosk/kiosk.toml` (system-wide)
/// 3. `~/.config/kiosk/kiosk.toml` (user XDG config)
/// 4. `./kiosk.toml` (local directory)
/// 5. `KIOSK_*` environment variables
pub fn load_config() -> Result<KioskConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<KioskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KioskConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KioskConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KioskConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KioskConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment variable provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names
/// themselves contain underscores: `KIOSK_STORAGE_DATABASE_PATH` must map to
/// `storage.database_path`, and `KIOSK_ANNOUNCE_REMOTE_API_KEY` to
/// `announce.remote.api_key`.
fn env_provider() -> Env {
    Env::prefixed("KIOSK_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    key.replacen("kiosk_", "kiosk.", 1)
        .replacen("storage_", "storage.", 1)
        .replacen("announce_", "announce.", 1)
        .replacen("announce.local_", "announce.local.", 1)
        .replacen("announce.remote_", "announce.remote.", 1)
}
