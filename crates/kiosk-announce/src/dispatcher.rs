// SPDX-FileCopyrightText: 2026 Kiosk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-flight announcement playback.
//!
//! [`DispatcherHandle::announce`] is synchronous so it can be called from a
//! queue store subscriber. It de-duplicates, assigns the next voice, and
//! pushes the item onto an unbounded FIFO channel. One worker task drains
//! the channel, playing one item at a time with a gap after each.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use kiosk_config::model::AnnounceConfig;
use kiosk_core::{KioskError, SpeechBackend, Voice};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::announcement::{Announcement, AnnouncementKey};
use crate::dedup::RecentKeys;

/// Capacity of the playback outcome broadcast.
const OUTCOME_CHANNEL_CAPACITY: usize = 64;

/// Dispatcher tuning.
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    /// Text template with `{ticket}` and `{station}` placeholders.
    pub template: String,
    /// Pause after each item before the next one starts.
    pub gap: Duration,
    /// Longest a single backend attempt may take.
    pub playback_timeout: Duration,
    pub history_capacity: usize,
    pub history_clear_after: Duration,
}

impl DispatcherSettings {
    pub fn from_config(config: &AnnounceConfig) -> Self {
        Self {
            template: config.template.clone(),
            gap: Duration::from_millis(config.gap_ms),
            playback_timeout: Duration::from_secs(config.playback_timeout_secs),
            history_capacity: config.history_capacity,
            history_clear_after: Duration::from_secs(config.history_clear_secs),
        }
    }
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self::from_config(&AnnounceConfig::default())
    }
}

/// Result of [`DispatcherHandle::announce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Queued for playback in this voice.
    Enqueued(Voice),
    /// The same call was already announced or queued.
    Duplicate,
    /// The dispatcher no longer accepts work.
    Closed,
}

/// How one queued item ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackResult {
    Played { backend: String },
    Failed,
}

/// Published on [`DispatcherHandle::outcomes`] after each item.
#[derive(Debug, Clone)]
pub struct PlaybackOutcome {
    pub key: AnnouncementKey,
    pub voice: Voice,
    pub result: PlaybackResult,
}

struct Queued {
    announcement: Announcement,
    voice: Voice,
}

struct Intake {
    tx: Option<mpsc::UnboundedSender<Queued>>,
    next_voice: Voice,
}

/// Entry point: spawns the playback worker.
pub struct AnnouncementDispatcher;

impl AnnouncementDispatcher {
    /// Start the worker on the current tokio runtime.
    ///
    /// Backends are tried in the given order for every item. Cancelling
    /// `cancel` abandons the item in progress and stops the worker.
    pub fn spawn(
        settings: DispatcherSettings,
        backends: Vec<Arc<dyn SpeechBackend>>,
        cancel: CancellationToken,
    ) -> DispatcherHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (outcomes, _) = broadcast::channel(OUTCOME_CHANNEL_CAPACITY);
        let playing = Arc::new(AtomicBool::new(false));

        let intake = Intake {
            tx: Some(tx),
            next_voice: Voice::Female,
        };
        let recent = Arc::new(Mutex::new(RecentKeys::new(
            settings.history_capacity,
            settings.history_clear_after,
        )));

        let worker = Worker {
            settings,
            recent: Arc::clone(&recent),
            backends,
            playing: Arc::clone(&playing),
            outcomes: outcomes.clone(),
            cancel,
        };
        let task = tokio::spawn(worker.run(rx));

        DispatcherHandle {
            intake: Mutex::new(intake),
            recent,
            playing,
            outcomes,
            task: tokio::sync::Mutex::new(Some(task)),
        }
    }
}

/// Handle for feeding and stopping a running dispatcher.
pub struct DispatcherHandle {
    intake: Mutex<Intake>,
    /// Shared with the worker, which settles keys as items finish.
    recent: Arc<Mutex<RecentKeys>>,
    playing: Arc<AtomicBool>,
    outcomes: broadcast::Sender<PlaybackOutcome>,
    task: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl DispatcherHandle {
    /// Queue an announcement unless the same call was seen recently.
    pub fn announce(&self, announcement: Announcement) -> EnqueueOutcome {
        let mut intake = self.intake.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = intake.tx.clone() else {
            debug!(ticket = %announcement.ticket_number, "dispatcher closed; announcement ignored");
            return EnqueueOutcome::Closed;
        };

        let fresh = self
            .recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(announcement.key());
        if !fresh {
            debug!(
                ticket = %announcement.ticket_number,
                called_at = %announcement.called_at,
                "duplicate announcement dropped"
            );
            return EnqueueOutcome::Duplicate;
        }

        let voice = intake.next_voice;
        intake.next_voice = voice.toggled();
        let ticket = announcement.ticket_number.clone();
        if tx.send(Queued { announcement, voice }).is_err() {
            intake.tx = None;
            return EnqueueOutcome::Closed;
        }
        debug!(ticket = %ticket, %voice, "announcement queued");
        EnqueueOutcome::Enqueued(voice)
    }

    /// Whether an announcement is playing right now.
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// Subscribe to per-item playback outcomes.
    pub fn outcomes(&self) -> broadcast::Receiver<PlaybackOutcome> {
        self.outcomes.subscribe()
    }

    /// Stop accepting announcements. Already queued items still play.
    pub fn close(&self) {
        let mut intake = self.intake.lock().unwrap_or_else(PoisonError::into_inner);
        if intake.tx.take().is_some() {
            debug!("announcement intake closed");
        }
    }

    /// Close intake and wait up to `timeout` for the queue to drain.
    ///
    /// On timeout the worker is aborted, which kills any playback process.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), KioskError> {
        self.close();
        let Some(mut task) = self.task.lock().await.take() else {
            return Ok(());
        };
        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(KioskError::Internal(format!(
                "announcement worker failed: {e}"
            ))),
            Err(_) => {
                warn!(?timeout, "announcement queue did not drain in time; aborting");
                task.abort();
                Err(KioskError::Timeout { duration: timeout })
            }
        }
    }
}

struct Worker {
    settings: DispatcherSettings,
    recent: Arc<Mutex<RecentKeys>>,
    backends: Vec<Arc<dyn SpeechBackend>>,
    playing: Arc<AtomicBool>,
    outcomes: broadcast::Sender<PlaybackOutcome>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Queued>) {
        info!(backends = self.backends.len(), "announcement dispatcher started");
        loop {
            let item = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                item = rx.recv() => match item {
                    Some(item) => item,
                    None => break,
                },
            };

            self.playing.store(true, Ordering::SeqCst);
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    self.playing.store(false, Ordering::SeqCst);
                    debug!(ticket = %item.announcement.ticket_number, "playback abandoned on shutdown");
                    break;
                }
                result = self.play(&item) => result,
            };
            self.playing.store(false, Ordering::SeqCst);

            let key = item.announcement.key();
            self.recent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .settle(&key);
            // No receivers is fine.
            let _ = self.outcomes.send(PlaybackOutcome {
                key,
                voice: item.voice,
                result,
            });

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.gap) => {}
            }
        }
        info!("announcement dispatcher stopped");
    }

    /// Try each backend in order; the first success wins.
    async fn play(&self, item: &Queued) -> PlaybackResult {
        let text = item.announcement.render(&self.settings.template);
        let mut attempts = Vec::with_capacity(self.backends.len());

        for backend in &self.backends {
            match tokio::time::timeout(
                self.settings.playback_timeout,
                backend.speak(&text, item.voice),
            )
            .await
            {
                Ok(Ok(())) => {
                    info!(
                        ticket = %item.announcement.ticket_number,
                        backend = backend.name(),
                        voice = %item.voice,
                        "announcement played"
                    );
                    return PlaybackResult::Played {
                        backend: backend.name().to_string(),
                    };
                }
                Ok(Err(e)) => {
                    warn!(backend = backend.name(), error = %e, "speech backend failed; trying next");
                    attempts.push(format!("{}: {e}", backend.name()));
                }
                Err(_) => {
                    warn!(
                        backend = backend.name(),
                        timeout = ?self.settings.playback_timeout,
                        "speech backend timed out; trying next"
                    );
                    attempts.push(format!(
                        "{}: timed out after {:?}",
                        backend.name(),
                        self.settings.playback_timeout
                    ));
                }
            }
        }

        let failure = KioskError::SpeechBackendFailure {
            ticket_number: item.announcement.ticket_number.clone(),
            attempts,
        };
        error!(error = %failure, "announcement dropped");
        PlaybackResult::Failed
    }
}
