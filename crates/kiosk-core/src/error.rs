// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the kiosk queue system.

use thiserror::Error;

/// The primary error type shared by the queue store, the announcement
/// dispatcher, the storage mirror, and configuration loading.
#[derive(Debug, Error)]
pub enum KioskError {
    /// A service id that is not in the configured catalog.
    #[error("unknown service `{service_id}`")]
    InvalidService { service_id: String },

    /// An operation referenced a station or ticket that does not exist,
    /// or a station that holds no ticket.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A ticket was requested for a station that is closed.
    #[error("station `{station_id}` is closed")]
    StationClosed { station_id: String },

    /// The station already holds a ticket and must complete or skip it first.
    #[error("station `{station_id}` is already serving a ticket")]
    StationBusy { station_id: String },

    /// The station is not configured to serve the requested service.
    #[error("station `{station_id}` does not serve `{service_id}`")]
    ServiceNotOffered {
        station_id: String,
        service_id: String,
    },

    /// An entity with the same id already exists.
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: &'static str, id: String },

    /// Every speech backend failed for one announcement.
    #[error("all speech backends failed for {ticket_number}: {}", attempts.join("; "))]
    SpeechBackendFailure {
        ticket_number: String,
        attempts: Vec<String>,
    },

    /// A single speech backend failed.
    #[error("speech backend `{backend}` failed: {message}")]
    Speech {
        backend: String,
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors (invalid TOML, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Another kiosk process holds the queue database.
    #[error("queue database `{path}` is in use by another kiosk process")]
    InUse { path: String },

    /// Persistence errors (database open, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KioskError {
    /// Shorthand for a missing station.
    pub fn station_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "station",
            id: id.into(),
        }
    }

    /// Shorthand for a missing ticket.
    pub fn ticket_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "ticket",
            id: id.into(),
        }
    }

    /// Whether this error is a rejected transition that staff can act on,
    /// as opposed to a system fault.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidService { .. }
                | Self::NotFound { .. }
                | Self::StationClosed { .. }
                | Self::StationBusy { .. }
                | Self::ServiceNotOffered { .. }
                | Self::AlreadyExists { .. }
                | Self::InUse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_rejections_are_user_facing() {
        assert!(KioskError::station_not_found("w1").is_user_facing());
        assert!(
            KioskError::StationBusy {
                station_id: "w1".into()
            }
            .is_user_facing()
        );
        assert!(
            KioskError::InUse {
                path: "kiosk.db".into()
            }
            .is_user_facing()
        );
        assert!(!KioskError::Internal("boom".into()).is_user_facing());
        assert!(
            !KioskError::Storage {
                source: Box::new(std::io::Error::other("disk"))
            }
            .is_user_facing()
        );
    }

    #[test]
    fn speech_failure_lists_every_attempt() {
        let err = KioskError::SpeechBackendFailure {
            ticket_number: "ENRO-004".into(),
            attempts: vec!["local: exit 1".into(), "remote: 429".into()],
        };
        assert_eq!(
            err.to_string(),
            "all speech backends failed for ENRO-004: local: exit 1; remote: 429"
        );
    }
}
