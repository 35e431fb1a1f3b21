// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Epoch-based debouncing of raw change notifications.
//!
//! ```text
//! raw event
//!    |
//!    v
//! suppressed? --yes--> drop (never retried)
//!    | no
//!    v
//! cancel token(epoch N-1)
//! epoch = N, current = N
//! spawn pipeline(EpochStamp N)
//!    |
//!    v
//! sleep(debounce) | cancelled --> silent exit
//!    |
//!    v
//! stamp.check() at every step; stale epochs never reach the callback
//! ```
//!
//! The scheduler is owned by the single coordinating loop; it is the only
//! writer of the epoch.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use super::monitor::VerificationPipeline;
use crate::error::{SentryError, SentryResult};

/// Identity of one scheduled pipeline run.
#[derive(Debug, Clone)]
pub struct EpochStamp {
    epoch: u64,
    current: Arc<AtomicU64>,
    token: CancellationToken,
}

impl EpochStamp {
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// True while no newer event has superseded this run.
    #[must_use]
    pub fn is_current(&self) -> bool {
        !self.token.is_cancelled() && self.current.load(Ordering::SeqCst) == self.epoch
    }

    /// Checkpoint: fails with `Cancelled` once superseded.
    ///
    /// # Errors
    ///
    /// Returns `SentryError::Cancelled` if this run is no longer current.
    pub fn check(&self) -> SentryResult<()> {
        if self.is_current() {
            Ok(())
        } else {
            Err(SentryError::Cancelled)
        }
    }
}

/// Turns raw notifications into at most one live pipeline run.
pub struct DebounceScheduler {
    pipeline: Arc<VerificationPipeline>,
    epoch: u64,
    current: Arc<AtomicU64>,
    pending: Option<CancellationToken>,
    shutdown: CancellationToken,
}

impl DebounceScheduler {
    /// Pipelines are cancelled when `shutdown` fires.
    #[must_use]
    pub fn new(pipeline: Arc<VerificationPipeline>, shutdown: CancellationToken) -> Self {
        Self {
            pipeline,
            epoch: 0,
            current: Arc::new(AtomicU64::new(0)),
            pending: None,
            shutdown,
        }
    }

    /// Latest epoch handed out.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Handles one raw change notification.
    ///
    /// Returns the new epoch, or `None` if the event was dropped because a
    /// suppression scope is held. Must be called within a tokio runtime.
    pub fn on_raw_event(&mut self) -> Option<u64> {
        if self.pipeline.gate().is_suppressed() {
            trace!("raw event dropped, suppression active");
            return None;
        }

        self.cancel_pending();
        self.epoch += 1;
        self.current.store(self.epoch, Ordering::SeqCst);

        let token = self.shutdown.child_token();
        self.pending = Some(token.clone());
        let stamp = EpochStamp {
            epoch: self.epoch,
            current: Arc::clone(&self.current),
            token,
        };
        trace!(epoch = self.epoch, "debounce scheduled");

        let pipeline = Arc::clone(&self.pipeline);
        tokio::spawn(async move { pipeline.run(stamp).await });
        Some(self.epoch)
    }

    /// Cancels the in-flight pipeline, if any.
    pub fn cancel_pending(&mut self) {
        if let Some(previous) = self.pending.take() {
            previous.cancel();
        }
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
