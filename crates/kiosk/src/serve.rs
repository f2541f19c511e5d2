// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `kiosk serve` command implementation.
//!
//! Restores the queue from SQLite, mirrors every accepted transition back to
//! it, speaks "now serving" announcements, and runs the station console
//! until the operator quits or the process is signalled.

use std::sync::Arc;
use std::time::Duration;

use kiosk_announce::{
    Announcement, AnnouncementDispatcher, DispatcherHandle, DispatcherSettings, build_backends,
};
use kiosk_config::KioskConfig;
use kiosk_core::{HealthStatus, KioskError, SpeechBackend};
use kiosk_queue::{Notification, QueueStore, SubscriptionId};
use kiosk_storage::spawn_mirror;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::console;
use crate::runtime::QueueRuntime;
use crate::shutdown;

/// Longest the announcement queue may take to drain on shutdown.
const ANNOUNCE_DRAIN_TIMEOUT: Duration = Duration::from_secs(15);

/// Runs the `kiosk serve` command.
pub async fn run_serve(config: KioskConfig) -> Result<(), KioskError> {
    init_tracing(&config.kiosk.log_level);
    info!(site = %config.kiosk.name, "starting kiosk serve");

    let cancel = shutdown::install_signal_handler();
    let runtime = QueueRuntime::open(&config).await?;
    let store = Arc::clone(&runtime.store);

    // Storage mirror. It ends once its subscription (the only sender) is dropped.
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let mirror = spawn_mirror(runtime.storage.clone(), events_rx, CancellationToken::new());
    let mirror_subscription = store.subscribe(move |n: &Notification| {
        if events_tx.send(n.event.clone()).is_err() {
            warn!(kind = n.event.kind(), "storage mirror stopped; event not persisted");
        }
    });

    let announcer = if config.announce.enabled {
        Some(start_announcer(&config, &store).await?)
    } else {
        info!("announcements disabled by configuration");
        None
    };

    // The console blocks on stdin; a signal ends serve without waiting for it.
    let console_store = Arc::clone(&store);
    let console_cancel = cancel.clone();
    let site = config.kiosk.name.clone();
    let console = tokio::task::spawn_blocking(move || {
        console::run_console(console_store, &site, console_cancel)
    });

    tokio::select! {
        result = console => match result {
            Ok(Ok(())) => info!("console closed"),
            Ok(Err(e)) => error!(error = %e, "console failed"),
            Err(e) => error!(error = %e, "console task panicked"),
        },
        _ = cancel.cancelled() => {}
    }
    cancel.cancel();

    if let Some(announcer) = announcer {
        announcer.stop(&store).await;
    }

    store.unsubscribe(mirror_subscription);
    match mirror.await {
        Ok(stats) => info!(applied = stats.applied, failed = stats.failed, "storage mirror drained"),
        Err(e) => error!(error = %e, "storage mirror task failed"),
    }
    runtime.close().await?;

    info!("kiosk serve shutdown complete");
    Ok(())
}

/// A running dispatcher plus the subscription that feeds it.
struct Announcer {
    handle: Arc<DispatcherHandle>,
    subscription: SubscriptionId,
    cancel: CancellationToken,
}

impl Announcer {
    async fn stop(self, store: &QueueStore) {
        store.unsubscribe(self.subscription);
        if let Err(e) = self.handle.shutdown(ANNOUNCE_DRAIN_TIMEOUT).await {
            warn!(error = %e, "announcement queue not drained");
        }
        self.cancel.cancel();
    }
}

async fn start_announcer(config: &KioskConfig, store: &QueueStore) -> Result<Announcer, KioskError> {
    let backends = build_backends(&config.announce)?;
    report_backend_health(&backends).await;

    let cancel = CancellationToken::new();
    let handle = Arc::new(AnnouncementDispatcher::spawn(
        DispatcherSettings::from_config(&config.announce),
        backends,
        cancel.clone(),
    ));
    let feed = Arc::clone(&handle);
    let subscription = store.subscribe(move |n: &Notification| {
        if let Some(announcement) = Announcement::from_event(&n.event) {
            feed.announce(announcement);
        }
    });
    Ok(Announcer {
        handle,
        subscription,
        cancel,
    })
}

async fn report_backend_health(backends: &[Arc<dyn SpeechBackend>]) {
    for backend in backends {
        match backend.health_check().await {
            Ok(HealthStatus::Healthy) => info!(backend = backend.name(), "speech backend ready"),
            Ok(HealthStatus::Degraded(reason)) | Ok(HealthStatus::Unhealthy(reason)) => {
                warn!(backend = backend.name(), %reason, "speech backend may fail; fallbacks will be used");
            }
            Err(e) => warn!(backend = backend.name(), error = %e, "speech backend health check failed"),
        }
    }
}

/// Initializes the tracing subscriber with the given log level.
///
/// `RUST_LOG` overrides the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kiosk={log_level},warn")));

    // A subscriber may already be installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
}
