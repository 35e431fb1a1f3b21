// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Polling wait for an editor to release the watched file.
//!
//! ```text
//! loop {
//!   open(read+write, exclusive) ok? --> true
//!   deadline passed?               --> false
//!   sleep(poll) | cancelled        --> Err(Cancelled)
//! }
//! ```
//!
//! A missing file counts as available. A timeout too large to add to the
//! current instant means no deadline; only cancellation ends such a wait.

use std::fs::{File, OpenOptions, TryLockError};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::error::{SentryError, SentryResult};

/// Default pause between two open attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy)]
pub struct LockWaiter {
    poll_interval: Duration,
}

impl Default for LockWaiter {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl LockWaiter {
    #[must_use]
    pub const fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Waits until `path` can be opened exclusively, for at most `timeout`.
    ///
    /// Returns `Ok(true)` as soon as an attempt succeeds and `Ok(false)` once
    /// the timeout has elapsed.
    ///
    /// # Errors
    ///
    /// Returns `SentryError::Cancelled` if `cancel` fires between attempts.
    pub async fn wait_until_unlocked(
        &self,
        path: &Path,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> SentryResult<bool> {
        let deadline = Instant::now().checked_add(timeout);
        let mut attempts = 0_u32;
        loop {
            if cancel.is_cancelled() {
                return Err(SentryError::Cancelled);
            }
            attempts += 1;
            if is_available(path) {
                trace!(path = %path.display(), attempts, "file is available");
                return Ok(true);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                debug!(path = %path.display(), attempts, "file still locked at deadline");
                return Ok(false);
            }
            tokio::select! {
                () = cancel.cancelled() => return Err(SentryError::Cancelled),
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }
}

/// One exclusive open attempt; the handle is closed immediately.
#[must_use]
pub fn is_available(path: &Path) -> bool {
    let mut options = OpenOptions::new();
    options.read(true).write(true);
    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        options.share_mode(0);
    }

    match options.open(path) {
        Ok(file) => holds_exclusive_lock(&file),
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            trace!(path = %path.display(), error = %e, "exclusive open failed");
            false
        }
    }
}

fn holds_exclusive_lock(file: &File) -> bool {
    match file.try_lock() {
        Ok(()) => true,
        Err(TryLockError::WouldBlock) => false,
        // Filesystems without lock support: the open itself is all we can check.
        Err(TryLockError::Error(_)) => true,
    }
}
