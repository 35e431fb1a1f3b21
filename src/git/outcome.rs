// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Result types for git invocations and repository operations.
//!
//! ```text
//! CommandOutcome   one per git invocation, internal
//!   exit_code, stdout, stderr, success, interrupted, summary()
//!        |
//!        v
//! OperationResult  one per Pull/Commit/Push, user-facing
//!   success, message   (never carries exit codes)
//! ```

use serde::Serialize;

/// Exit code reported when git could not be launched at all.
pub const LAUNCH_FAILED_EXIT_CODE: i32 = -1;

const INTERRUPTED_SUMMARY: &str = "interrupted";

/// Captured result of a single git invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    exit_code: i32,
    stdout: String,
    stderr: String,
    success: bool,
    interrupted: bool,
}

impl CommandOutcome {
    #[must_use]
    pub const fn new(exit_code: i32, stdout: String, stderr: String, success: bool) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            success,
            interrupted: false,
        }
    }

    /// Outcome for a process that could not be started.
    #[must_use]
    pub fn launch_failed(message: impl Into<String>) -> Self {
        Self::new(LAUNCH_FAILED_EXIT_CODE, String::new(), message.into(), false)
    }

    /// Outcome for a command killed (or never started) on cancellation.
    #[must_use]
    pub fn interrupted() -> Self {
        Self {
            interrupted: true,
            ..Self::launch_failed(INTERRUPTED_SUMMARY)
        }
    }

    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        self.interrupted
    }

    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    /// Human-readable summary: error text, else output, else the exit code.
    #[must_use]
    pub fn summary(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        format!("exit code {}", self.exit_code)
    }
}

/// Uniform result of a repository operation, ready for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    success: bool,
    message: String,
}

impl OperationResult {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for OperationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}
