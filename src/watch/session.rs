// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The long-lived watch session the front end talks to.
//!
//! Owns the current target, its [`GitOperations`] and [`ChangeMonitor`],
//! and the shared [`SuppressionGate`]. Programmatic writes to the watched
//! file (retargeting, pull-then-open) run inside a suppression scope so the
//! monitor ignores them.

use futures_util::future::BoxFuture;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::monitor::{ChangeMonitor, MonitorEvent, MonitorSettings};
use super::suppress::SuppressionGate;
use crate::core::process::builder::ProcessBuilder;
use crate::error::{Result, SentryResult};
use crate::git::ops::GitOperations;
use crate::git::outcome::OperationResult;
use crate::git::runner::CommandRunner;
use crate::git::target::WatchTarget;

/// Hands the watched file to whatever edits it.
pub trait FileOpener: Send + Sync {
    fn open<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<()>>;
}

/// Opens the file by running `<program> <path>`.
///
/// The program is expected to return once the file is handed off
/// (`xdg-open`, `open`, `start`).
#[derive(Debug, Clone)]
pub struct CommandOpener {
    program: String,
}

impl CommandOpener {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Desktop default opener of the current platform.
    #[must_use]
    pub fn platform_default() -> Self {
        let program = if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(windows) {
            "explorer"
        } else {
            "xdg-open"
        };
        Self::new(program)
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl FileOpener for CommandOpener {
    fn open<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            ProcessBuilder::new(&self.program)
                .arg(path)
                .name("opener")
                .quiet()
                .run()
                .await?;
            Ok(())
        })
    }
}

pub struct WatchSession {
    runner: Arc<dyn CommandRunner>,
    gate: SuppressionGate,
    settings: MonitorSettings,
    operations: Arc<GitOperations>,
    monitor: ChangeMonitor,
    events: mpsc::UnboundedReceiver<MonitorEvent>,
}

impl WatchSession {
    /// Creates a stopped session for `target`.
    #[must_use]
    pub fn new(
        target: WatchTarget,
        runner: Arc<dyn CommandRunner>,
        gate: SuppressionGate,
        settings: MonitorSettings,
    ) -> Self {
        let operations = Arc::new(GitOperations::new(Arc::new(target), Arc::clone(&runner)));
        let (monitor, events) = ChangeMonitor::new(Arc::clone(&operations), gate.clone(), settings);
        Self {
            runner,
            gate,
            settings,
            operations,
            monitor,
            events,
        }
    }

    #[must_use]
    pub fn target(&self) -> &WatchTarget {
        self.operations.target()
    }

    #[must_use]
    pub const fn operations(&self) -> &Arc<GitOperations> {
        &self.operations
    }

    #[must_use]
    pub const fn gate(&self) -> &SuppressionGate {
        &self.gate
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.monitor.is_running()
    }

    /// # Errors
    ///
    /// See [`ChangeMonitor::start`].
    pub fn start(&mut self) -> SentryResult<()> {
        self.monitor.start()
    }

    pub fn stop(&mut self) {
        self.monitor.stop();
    }

    /// Next monitor event; `None` once the monitor is gone.
    pub async fn next_event(&mut self) -> Option<MonitorEvent> {
        self.events.recv().await
    }

    /// Switches to a different file.
    ///
    /// The old monitor is detached before the new one attaches; a running
    /// session keeps running on the new target.
    ///
    /// # Errors
    ///
    /// Returns a `GitError` if `path` is not a valid target, or a
    /// `WatchError` if the new watch cannot be attached. On error the
    /// session keeps its previous target.
    pub fn retarget(&mut self, path: impl AsRef<Path>) -> SentryResult<()> {
        let _scope = self.gate.suppress();
        let target = WatchTarget::new(path)?;
        let was_running = self.monitor.is_running();

        let operations = Arc::new(GitOperations::new(
            Arc::new(target),
            Arc::clone(&self.runner),
        ));
        let (mut monitor, events) =
            ChangeMonitor::new(Arc::clone(&operations), self.gate.clone(), self.settings);

        self.monitor.stop();
        if was_running && let Err(e) = monitor.start() {
            self.monitor.start()?;
            return Err(e);
        }

        info!(from = %self.target(), to = %operations.target(), "retargeted");
        self.operations = operations;
        self.monitor = monitor;
        self.events = events;
        Ok(())
    }

    /// Pulls, then opens the file if the pull succeeded.
    ///
    /// The whole sequence runs suppressed, so the files written by the pull
    /// and the editor start-up never trigger a change event.
    pub async fn pull_and_open(
        &self,
        opener: &dyn FileOpener,
        cancel: &CancellationToken,
    ) -> OperationResult {
        let _scope = self.gate.suppress();
        let result = self.operations.pull(cancel).await;
        if !result.success() {
            return result;
        }
        match opener.open(self.target().file()).await {
            Ok(()) => result,
            Err(e) => OperationResult::failed(format!(
                "{} Opening the file failed: {e:#}",
                result.message()
            )),
        }
    }
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("target", self.target())
            .field("running", &self.is_running())
            .field("suppressed", &self.gate.active_scopes())
            .finish_non_exhaustive()
    }
}
