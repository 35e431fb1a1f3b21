// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Single git invocation behind a trait seam.
//!
//! ```text
//! CommandRunner (trait, dyn)
//!       |
//!       v
//! ShellRunner --> ProcessBuilder --> git <args>   (cwd = repo root)
//!       |                 killed when the caller's token fires
//!       v
//! CommandOutcome  (launch failure or cancellation => exit -1, success = false)
//! ```
//!
//! No retries here; callers decide.

use futures_util::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::outcome::CommandOutcome;
use crate::core::process::builder::{ProcessBuilder, ProcessFlags};

/// How the exit code is turned into a success flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitCheck {
    /// Exit code 0 is success, anything else is failure.
    #[default]
    Classify,
    /// Always successful; the caller interprets the raw exit code.
    Ignore,
}

impl ExitCheck {
    #[must_use]
    pub const fn classify(self, exit_code: i32) -> bool {
        match self {
            Self::Classify => exit_code == 0,
            Self::Ignore => true,
        }
    }
}

/// Runs one version-control command in a repository.
///
/// Implementations never return an error: failures, including a missing
/// executable, are encoded in the [`CommandOutcome`]. When `cancel` fires
/// the command is stopped and [`CommandOutcome::interrupted`] is returned.
pub trait CommandRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        repo_root: &'a Path,
        args: &'a [&'a str],
        check: ExitCheck,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, CommandOutcome>;
}

/// Production runner that shells out to the git CLI.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl ShellRunner {
    /// Creates a runner for `program`, resolving bare names through PATH.
    ///
    /// An unresolvable name is kept as-is so that the failure shows up as a
    /// launch error on first use instead of at construction.
    #[must_use]
    pub fn new(program: &str) -> Self {
        let is_bare_name = Path::new(program).components().count() == 1;
        let program = if is_bare_name {
            ProcessBuilder::find(program).unwrap_or_else(|| PathBuf::from(program))
        } else {
            PathBuf::from(program)
        };
        Self {
            program,
            timeout: None,
        }
    }

    /// Kills commands that run longer than `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    async fn execute(
        &self,
        repo_root: &Path,
        args: &[&str],
        check: ExitCheck,
        cancel: &CancellationToken,
    ) -> CommandOutcome {
        // Never let a credential prompt hang while the gate is held.
        let builder = ProcessBuilder::new(&self.program)
            .name("git")
            .args(args)
            .cwd(repo_root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GCM_INTERACTIVE", "never")
            .flag(ProcessFlags::ALLOW_FAILURE)
            .capture_output()
            .maybe_timeout(self.timeout);

        match builder.run_with_cancellation(cancel.clone()).await {
            Ok(output) if output.is_interrupted() => {
                debug!(args = ?args, "git interrupted");
                CommandOutcome::interrupted()
            }
            Ok(output) => {
                let (exit_code, stdout, stderr) = output.into_parts();
                let success = check.classify(exit_code);
                debug!(args = ?args, exit_code, success, "git finished");
                CommandOutcome::new(exit_code, stdout, stderr, success)
            }
            Err(e) => {
                warn!(args = ?args, error = %e, "git could not be run");
                CommandOutcome::launch_failed(format!("{e:#}"))
            }
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("git")
    }
}

impl CommandRunner for ShellRunner {
    fn run<'a>(
        &'a self,
        repo_root: &'a Path,
        args: &'a [&'a str],
        check: ExitCheck,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, CommandOutcome> {
        Box::pin(self.execute(repo_root, args, check, cancel))
    }
}
