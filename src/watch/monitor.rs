// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Change monitor for the watched file.
//!
//! ```text
//! notify thread --flume--> event loop (owns DebounceScheduler)
//!                               |
//!                     relevant? | create/modify/rename of the file
//!                               v
//!                     scheduler.on_raw_event()
//!                               |
//!                   (after quiescence, current epoch only)
//!                               v
//!   VerificationPipeline: suppressed? -> LockWaiter -> has_pending_changes
//!                               |
//!                               v
//!              MonitorEvent::ChangesDetected | Warning
//! ```
//!
//! Every failure inside the pipeline becomes a `Warning`; the loop always
//! returns to watching.

use bon::Builder;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, info, trace, warn};

use super::debounce::{DebounceScheduler, EpochStamp};
use super::lock::LockWaiter;
use super::suppress::SuppressionGate;
use crate::error::{SentryResult, WatchError};
use crate::git::ops::GitOperations;
use crate::git::target::WatchTarget;

/// Timing knobs of the monitor.
#[derive(Debug, Clone, Copy, Builder)]
pub struct MonitorSettings {
    /// Quiet period required after the last raw event.
    #[builder(setters(name = with_debounce), default = Duration::from_millis(900))]
    debounce: Duration,
    /// How long to wait for the editor to release the file.
    #[builder(setters(name = with_lock_timeout), default = Duration::from_secs(25))]
    lock_timeout: Duration,
    /// Pause between two exclusive-open attempts.
    #[builder(setters(name = with_lock_poll), default = Duration::from_millis(250))]
    lock_poll: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl MonitorSettings {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    #[must_use]
    pub const fn lock_poll(&self) -> Duration {
        self.lock_poll
    }
}

/// What the monitor reports downstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// The editor is done and the file really differs from git.
    ChangesDetected { path: PathBuf },
    /// Something went wrong; the monitor keeps watching.
    Warning { message: String },
}

/// Quiescence -> lock wait -> pending-change check -> event.
pub struct VerificationPipeline {
    operations: Arc<GitOperations>,
    gate: SuppressionGate,
    lock_waiter: LockWaiter,
    settings: MonitorSettings,
    events: mpsc::UnboundedSender<MonitorEvent>,
}

impl VerificationPipeline {
    #[must_use]
    pub fn new(
        operations: Arc<GitOperations>,
        gate: SuppressionGate,
        settings: MonitorSettings,
    ) -> (Self, mpsc::UnboundedReceiver<MonitorEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let pipeline = Self {
            operations,
            gate,
            lock_waiter: LockWaiter::new(settings.lock_poll()),
            settings,
            events,
        };
        (pipeline, receiver)
    }

    #[must_use]
    pub const fn gate(&self) -> &SuppressionGate {
        &self.gate
    }

    #[must_use]
    pub fn target(&self) -> &WatchTarget {
        self.operations.target()
    }

    fn emit(&self, event: MonitorEvent) {
        if self.events.send(event).is_err() {
            trace!("monitor event dropped, no receiver");
        }
    }

    pub(crate) fn warn(&self, message: String) {
        warn!(path = %self.target(), %message, "monitor warning");
        self.emit(MonitorEvent::Warning { message });
    }

    /// Runs one scheduled epoch to completion; never fails.
    pub(crate) async fn run(&self, stamp: EpochStamp) {
        tokio::select! {
            () = stamp.token().cancelled() => {
                trace!(epoch = stamp.epoch(), "debounce superseded");
                return;
            }
            () = tokio::time::sleep(self.settings.debounce()) => {}
        }

        let verified = self
            .verify(&stamp)
            .instrument(debug_span!("verify", epoch = stamp.epoch()))
            .await;
        match verified {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => trace!(epoch = stamp.epoch(), "pipeline cancelled"),
            Err(e) => self.warn(format!("Change verification failed: {e}")),
        }
    }

    async fn verify(&self, stamp: &EpochStamp) -> SentryResult<()> {
        stamp.check()?;
        if self.gate.is_suppressed() {
            debug!(epoch = stamp.epoch(), "suppression began during debounce, skipping");
            return Ok(());
        }

        debug!(epoch = stamp.epoch(), path = %self.target(), "quiescent, waiting for file lock");
        let timeout = self.settings.lock_timeout();
        let unlocked = self
            .lock_waiter
            .wait_until_unlocked(self.target().file(), timeout, stamp.token())
            .await?;
        stamp.check()?;
        if !unlocked {
            let timed_out = WatchError::LockTimeout {
                path: self.target().file().to_path_buf(),
                timeout,
            };
            self.warn(timed_out.to_string());
            return Ok(());
        }

        let dirty = self.operations.has_pending_changes(stamp.token()).await?;
        if !dirty {
            debug!(epoch = stamp.epoch(), "no pending changes, nothing to report");
            return Ok(());
        }

        stamp.check()?;
        info!(path = %self.target(), "changes detected");
        self.emit(MonitorEvent::ChangesDetected {
            path: self.target().file().to_path_buf(),
        });
        Ok(())
    }
}

struct RunningWatch {
    watcher: RecommendedWatcher,
    shutdown: CancellationToken,
    handle: JoinHandle<()>,
}

/// File system watcher driving a [`VerificationPipeline`].
pub struct ChangeMonitor {
    pipeline: Arc<VerificationPipeline>,
    running: Option<RunningWatch>,
}

impl ChangeMonitor {
    /// Creates a stopped monitor and the receiver for its events.
    #[must_use]
    pub fn new(
        operations: Arc<GitOperations>,
        gate: SuppressionGate,
        settings: MonitorSettings,
    ) -> (Self, mpsc::UnboundedReceiver<MonitorEvent>) {
        let (pipeline, receiver) = VerificationPipeline::new(operations, gate, settings);
        let monitor = Self {
            pipeline: Arc::new(pipeline),
            running: None,
        };
        (monitor, receiver)
    }

    #[must_use]
    pub fn target(&self) -> &WatchTarget {
        self.pipeline.target()
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Attaches to the file system, detaching any previous watch first.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a `WatchError` if the notification backend cannot be created
    /// or the containing directory cannot be watched.
    pub fn start(&mut self) -> SentryResult<()> {
        self.stop();

        let (raw_tx, raw_rx) = flume::unbounded();
        let mut watcher = notify::recommended_watcher(move |res| {
            // Receiver gone means the monitor is stopping.
            let _ = raw_tx.send(res);
        })
        .map_err(WatchError::Notify)?;

        let root = self.pipeline.target().repo_root().to_path_buf();
        watcher
            .watch(&root, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::WatchPath {
                path: root.clone(),
                source,
            })?;

        let shutdown = CancellationToken::new();
        let scheduler = DebounceScheduler::new(Arc::clone(&self.pipeline), shutdown.clone());
        let handle = tokio::spawn(event_loop(
            raw_rx,
            scheduler,
            Arc::clone(&self.pipeline),
            shutdown.clone(),
        ));

        info!(path = %self.pipeline.target(), "watching");
        self.running = Some(RunningWatch {
            watcher,
            shutdown,
            handle,
        });
        Ok(())
    }

    /// Detaches from the file system and cancels any pending pipeline.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.shutdown.cancel();
            drop(running.watcher);
            running.handle.abort();
            info!(path = %self.pipeline.target(), "stopped watching");
        }
    }
}

impl Drop for ChangeMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn event_loop(
    raw_rx: flume::Receiver<notify::Result<Event>>,
    mut scheduler: DebounceScheduler,
    pipeline: Arc<VerificationPipeline>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            received = raw_rx.recv_async() => match received {
                Ok(Ok(event)) => {
                    if is_relevant(&event, pipeline.target().file()) {
                        trace!(kind = ?event.kind, "raw change");
                        scheduler.on_raw_event();
                    }
                }
                Ok(Err(e)) => pipeline.warn(format!("File watcher error: {e}")),
                Err(_) => {
                    pipeline.warn(WatchError::ChannelClosed.to_string());
                    break;
                }
            }
        }
    }
    debug!("event loop finished");
}

/// Create, content modification or rename touching the watched file.
///
/// Only the file name is compared: the watch is non-recursive on the
/// containing directory, and some backends report canonicalized parents.
#[must_use]
pub fn is_relevant(event: &Event, file: &Path) -> bool {
    let kind_matches = match event.kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    };
    kind_matches
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some() && p.file_name() == file.file_name())
}
