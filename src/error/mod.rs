// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Error handling module.
//!
//! ```text
//!            SentryError (<= 16 bytes)
//!                     |
//!      +--------+-----+-----+--------+-------+
//!      |        |           |        |       |
//!      v        v           v        v       v
//!     Git     Config     Process   Watch  Cancelled
//!     Box      Box         Box      Box
//!
//! Sub-errors (unboxed internally):
//!   Git     RepoNotFound, InvalidTarget, StatusFailed
//!   Config  MissingKey, InvalidValue
//!   Process SpawnFailed, Timeout
//!   Watch   Notify, WatchPath, LockTimeout, ChannelClosed
//! ```
//!
//! Failures of the four repository operations never surface as errors:
//! they are folded into an `OperationResult` (see `git::outcome`).

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Convenience alias for `anyhow::Result`.
pub type Result<T> = anyhow::Result<T>;

/// Result type using [`SentryError`].
pub type SentryResult<T> = std::result::Result<T, SentryError>;

/// Top-level library error type.
///
/// All sub-errors are boxed to keep this enum pointer-sized plus a tag.
#[derive(Debug, Error)]
pub enum SentryError {
    /// Git operation failed.
    #[error("git error: {0}")]
    Git(#[from] Box<GitError>),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] Box<ConfigError>),

    /// Process execution error.
    #[error("process error: {0}")]
    Process(#[from] Box<ProcessError>),

    /// File watching error.
    #[error("watch error: {0}")]
    Watch(#[from] Box<WatchError>),

    /// The operation was superseded or shut down before it finished.
    #[error("operation cancelled")]
    Cancelled,
}

impl SentryError {
    /// Returns true for [`SentryError::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// --- From implementations for boxing ---

/// Macro to generate `From` implementations that box the source error.
macro_rules! impl_from_boxed {
    ($($error:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$error> for SentryError {
                fn from(err: $error) -> Self {
                    SentryError::$variant(Box::new(err))
                }
            }
        )+
    };
}

impl_from_boxed! {
    GitError => Git,
    ConfigError => Config,
    ProcessError => Process,
    WatchError => Watch,
}

// --- Git Errors ---

/// Git and watch-target errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// The watched file does not live inside a git work tree.
    #[error("repository not found: {path}")]
    RepoNotFound { path: String },

    /// The path cannot be used as a watch target.
    #[error("invalid watch target '{path}': {reason}")]
    InvalidTarget { path: String, reason: String },

    /// The pending-change query itself failed.
    #[error("unable to query status of {path}: {summary}")]
    StatusFailed { path: String, summary: String },
}

// --- Config Errors ---

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required configuration key.
    #[error("missing required config key '{key}' in section '[{section}]'")]
    MissingKey { section: String, key: String },

    /// Invalid configuration value.
    #[error("invalid value for '{key}' in section '[{section}]': {message}")]
    InvalidValue {
        section: String,
        key: String,
        message: String,
    },
}

// --- Process Errors ---

/// Process execution errors.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Failed to spawn process.
    #[error("failed to spawn process '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Process timed out.
    #[error("process '{command}' timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

// --- Watch Errors ---

/// File watching and lock-wait errors.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The file system notification backend failed.
    #[error("file watcher failed: {0}")]
    Notify(#[from] notify::Error),

    /// Failed to register a path with the backend.
    #[error("failed to watch {path}: {source}")]
    WatchPath {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// The file stayed exclusively held past the wait timeout.
    #[error("{path} is still locked after {timeout:?}")]
    LockTimeout { path: PathBuf, timeout: Duration },

    /// The raw event channel closed unexpectedly.
    #[error("event channel closed")]
    ChannelClosed,
}
