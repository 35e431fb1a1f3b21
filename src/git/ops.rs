// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Serialized repository operations for the watched file.
//!
//! ```text
//!  has_pending_changes  pull  commit  push
//!            \            |     |     /
//!             v           v     v    v
//!          ,---------------------------,
//!          |  gate (one tokio Mutex)   |  held for the whole sequence
//!          '-------------+-------------'
//!                        v
//!                  CommandRunner
//!
//! commit: validate -> add -> diff --cached --quiet -> commit -> [push]
//!                             0: nothing to commit
//!                             1: proceed
//!                             *: ambiguous, abort
//! pull:   status (dirty => refuse) -> pull --ff-only
//! ```
//!
//! The caller's token also reaches the running git process: a command
//! interrupted mid-sequence ends the operation with "Operation cancelled.".

use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use super::outcome::{CommandOutcome, OperationResult};
use super::runner::{CommandRunner, ExitCheck};
use super::target::WatchTarget;
use crate::error::{GitError, SentryError, SentryResult};

pub const EMPTY_MESSAGE: &str = "Commit message cannot be empty.";
pub const CANCELLED_MESSAGE: &str = "Operation cancelled.";

/// Pull, commit, push and status for one [`WatchTarget`], never interleaved.
pub struct GitOperations {
    target: Arc<WatchTarget>,
    runner: Arc<dyn CommandRunner>,
    gate: Mutex<()>,
}

impl GitOperations {
    #[must_use]
    pub fn new(target: Arc<WatchTarget>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            target,
            runner,
            gate: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Waits for the gate unless `cancel` fires first.
    async fn acquire(&self, cancel: &CancellationToken) -> SentryResult<MutexGuard<'_, ()>> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(SentryError::Cancelled),
            guard = self.gate.lock() => Ok(guard),
        }
    }

    async fn git(
        &self,
        args: &[&str],
        check: ExitCheck,
        cancel: &CancellationToken,
    ) -> CommandOutcome {
        self.runner
            .run(self.target.repo_root(), args, check, cancel)
            .await
    }

    fn span(&self, op: &'static str) -> tracing::Span {
        info_span!("git_op", op, file = %self.target.relative())
    }

    /// Reports whether the watched file differs from the index or HEAD.
    ///
    /// # Errors
    ///
    /// Returns `SentryError::Cancelled` if `cancel` fires while waiting for
    /// the gate or during the query, and `GitError::StatusFailed` if the
    /// status query fails.
    pub async fn has_pending_changes(&self, cancel: &CancellationToken) -> SentryResult<bool> {
        async {
            let _guard = self.acquire(cancel).await?;
            self.pending_changes_locked(cancel).await
        }
        .instrument(self.span("status"))
        .await
    }

    /// Status query; the caller must hold the gate.
    async fn pending_changes_locked(&self, cancel: &CancellationToken) -> SentryResult<bool> {
        let path = self.target.relative();
        let outcome = self
            .git(&["status", "--porcelain", "--", path], ExitCheck::Classify, cancel)
            .await;
        if outcome.is_interrupted() {
            return Err(SentryError::Cancelled);
        }
        if !outcome.success() {
            return Err(GitError::StatusFailed {
                path: path.to_string(),
                summary: outcome.summary(),
            }
            .into());
        }
        let dirty = !outcome.stdout().trim().is_empty();
        debug!(path, dirty, "pending change query");
        Ok(dirty)
    }

    /// Fast-forward pull, refused while the watched file has local changes.
    pub async fn pull(&self, cancel: &CancellationToken) -> OperationResult {
        self.pull_gated(cancel).instrument(self.span("pull")).await
    }

    async fn pull_gated(&self, cancel: &CancellationToken) -> OperationResult {
        let Ok(_guard) = self.acquire(cancel).await else {
            return OperationResult::failed(CANCELLED_MESSAGE);
        };

        match self.pending_changes_locked(cancel).await {
            Ok(false) => {}
            Ok(true) => {
                warn!(path = %self.target, "pull refused, file has pending changes");
                return OperationResult::failed(format!(
                    "Pull blocked: local or staged changes exist in {}. \
                     Commit, stash or discard them first.",
                    self.target.relative()
                ));
            }
            Err(SentryError::Cancelled) => return OperationResult::failed(CANCELLED_MESSAGE),
            Err(e) => {
                return OperationResult::failed(format!("Unable to check for local changes: {e}"));
            }
        }

        let outcome = self
            .git(&["pull", "--ff-only"], ExitCheck::Classify, cancel)
            .await;
        if outcome.is_interrupted() {
            return OperationResult::failed(CANCELLED_MESSAGE);
        }
        if outcome.success() {
            info!(path = %self.target, "pull completed");
            OperationResult::ok(format!("Pull completed: {}", outcome.summary()))
        } else {
            OperationResult::failed(format!("Pull failed: {}", outcome.summary()))
        }
    }

    /// Stages and commits the watched file, optionally pushing afterwards.
    pub async fn commit(
        &self,
        message: &str,
        push_after_commit: bool,
        cancel: &CancellationToken,
    ) -> OperationResult {
        let message = message.trim();
        if message.is_empty() {
            return OperationResult::failed(EMPTY_MESSAGE);
        }
        self.commit_gated(message, push_after_commit, cancel)
            .instrument(self.span("commit"))
            .await
    }

    async fn commit_gated(
        &self,
        message: &str,
        push_after_commit: bool,
        cancel: &CancellationToken,
    ) -> OperationResult {
        let Ok(_guard) = self.acquire(cancel).await else {
            return OperationResult::failed(CANCELLED_MESSAGE);
        };

        let path = self.target.relative();
        let staged = self
            .git(&["add", "--", path], ExitCheck::Classify, cancel)
            .await;
        if staged.is_interrupted() {
            return OperationResult::failed(CANCELLED_MESSAGE);
        }
        if !staged.success() {
            return OperationResult::failed(format!("Staging failed: {}", staged.summary()));
        }

        let probe = self
            .git(&["diff", "--cached", "--quiet"], ExitCheck::Ignore, cancel)
            .await;
        if probe.is_interrupted() {
            return OperationResult::failed(CANCELLED_MESSAGE);
        }
        match probe.exit_code() {
            0 => return OperationResult::failed("There is nothing to commit."),
            1 => {}
            code => {
                warn!(exit_code = code, "staged-diff probe returned an unexpected exit code");
                return OperationResult::failed(format!(
                    "Unable to check staged changes: {}",
                    probe.summary()
                ));
            }
        }

        let committed = self
            .git(&["commit", "-m", message], ExitCheck::Classify, cancel)
            .await;
        if committed.is_interrupted() {
            return OperationResult::failed(CANCELLED_MESSAGE);
        }
        if !committed.success() {
            return OperationResult::failed(format!("Commit failed: {}", committed.summary()));
        }
        info!(path = %self.target, "commit completed");

        if !push_after_commit {
            return OperationResult::ok("Commit completed.");
        }

        let pushed = self.git(&["push"], ExitCheck::Classify, cancel).await;
        if pushed.is_interrupted() {
            return OperationResult::failed("Commit succeeded, but push was cancelled.");
        }
        if pushed.success() {
            info!(path = %self.target, "push completed");
            OperationResult::ok("Commit and push completed.")
        } else {
            // History already contains the commit; the caller still has to act.
            warn!(summary = %pushed.summary(), "push after commit failed");
            OperationResult::failed(format!(
                "Commit succeeded, but push failed: {}",
                pushed.summary()
            ))
        }
    }

    /// Pushes the current branch.
    pub async fn push(&self, cancel: &CancellationToken) -> OperationResult {
        async {
            let Ok(_guard) = self.acquire(cancel).await else {
                return OperationResult::failed(CANCELLED_MESSAGE);
            };

            let outcome = self.git(&["push"], ExitCheck::Classify, cancel).await;
            if outcome.is_interrupted() {
                return OperationResult::failed(CANCELLED_MESSAGE);
            }
            if outcome.success() {
                info!(path = %self.target, "push completed");
                OperationResult::ok(format!("Push completed: {}", outcome.summary()))
            } else {
                OperationResult::failed(format!("Push failed: {}", outcome.summary()))
            }
        }
        .instrument(self.span("push"))
        .await
    }
}

impl std::fmt::Debug for GitOperations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitOperations")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
