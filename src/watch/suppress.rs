// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Reference-counted suppression of automatic change handling.
//!
//! ```text
//! gate.suppress() --> SuppressionScope   counter += 1
//!                          |
//!                        drop            counter -= 1 (exactly once)
//!
//! is_suppressed()  <=>  counter > 0
//! ```
//!
//! Scopes nest: the gate reopens only after every holder released.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::trace;

/// Shared counter marking regions where programmatic writes happen.
#[derive(Debug, Clone, Default)]
pub struct SuppressionGate {
    counter: Arc<AtomicUsize>,
}

impl SuppressionGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a suppressed region; it lasts until the scope is dropped.
    #[must_use = "suppression ends as soon as the scope is dropped"]
    pub fn suppress(&self) -> SuppressionScope {
        let depth = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(depth, "suppression scope entered");
        SuppressionScope {
            counter: Arc::clone(&self.counter),
        }
    }

    #[must_use]
    pub fn is_suppressed(&self) -> bool {
        self.counter.load(Ordering::SeqCst) > 0
    }

    /// Number of scopes currently held.
    #[must_use]
    pub fn active_scopes(&self) -> usize {
        self.counter.load(Ordering::SeqCst)
    }
}

/// Release handle returned by [`SuppressionGate::suppress`].
///
/// Dropping it (normal return, `?`, panic unwind or a cancelled future)
/// releases the scope.
#[derive(Debug)]
pub struct SuppressionScope {
    counter: Arc<AtomicUsize>,
}

impl Drop for SuppressionScope {
    fn drop(&mut self) {
        let depth = self.counter.fetch_sub(1, Ordering::SeqCst) - 1;
        trace!(depth, "suppression scope released");
    }
}
