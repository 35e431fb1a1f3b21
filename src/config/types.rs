// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration sections.
//!
//! ```text
//! Config: GlobalConfig, WatchConfig, GitConfig, CommitConfig, OpenConfig
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::logging::LogLevel;

/// Global configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Log level for console output (0-5).
    pub log_level: LogLevel,
    /// Log level for file output (0-5).
    pub file_log_level: LogLevel,
    /// Path to log file; no file logging when unset.
    pub log_file: Option<PathBuf>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::INFO,
            file_log_level: LogLevel::TRACE,
            log_file: None,
        }
    }
}

/// The watched file and the monitor timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Absolute path of the watched file.
    pub file: Option<PathBuf>,
    /// Quiet period after the last change notification.
    pub debounce_ms: u64,
    /// How long to wait for the editor to release the file.
    pub lock_timeout_secs: u64,
    /// Pause between two exclusive-open attempts.
    pub lock_poll_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            file: None,
            debounce_ms: 900,
            lock_timeout_secs: 25,
            lock_poll_ms: 250,
        }
    }
}

impl WatchConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    #[must_use]
    pub const fn lock_poll(&self) -> Duration {
        Duration::from_millis(self.lock_poll_ms)
    }
}

/// Git executable settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitConfig {
    /// Git program; bare names are looked up on `PATH`.
    pub executable: String,
    /// Kill a git command after this many seconds.
    pub command_timeout_secs: Option<u64>,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            executable: "git".to_string(),
            command_timeout_secs: None,
        }
    }
}

impl GitConfig {
    #[must_use]
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

/// Automatic commit behaviour of `watch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommitConfig {
    /// Commit as soon as a real change is detected.
    pub auto_commit: bool,
    /// Message template; `{file}` becomes the watched file name.
    pub message: String,
    /// Push after every successful commit.
    pub push_after_commit: bool,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            auto_commit: false,
            message: "Update {file}".to_string(),
            push_after_commit: false,
        }
    }
}

impl CommitConfig {
    /// Expands the message template for `file_name`.
    #[must_use]
    pub fn render_message(&self, file_name: &str) -> String {
        self.message.replace("{file}", file_name)
    }
}

/// How `pull --open` hands the file to an editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenConfig {
    /// Opener program; the platform default when unset.
    pub command: Option<String>,
}
