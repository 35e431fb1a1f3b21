// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration management for gitsentry.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! Priority (low → high)
//! 1. defaults
//! 2. gitsentry.toml (cwd)
//! 3. --config
//! 4. GITSENTRY_* env vars
//! 5. --set / CLI flags
//! ```
//!
//! # Environment Variable Mapping
//!
//! ```text
//! GITSENTRY_WATCH__DEBOUNCE_MS=500   → watch.debounce_ms = 500
//! GITSENTRY_GIT__EXECUTABLE=/opt/git → git.executable = "/opt/git"
//! GITSENTRY_COMMIT__AUTO_COMMIT=true → commit.auto_commit = true
//! ```

pub mod loader;
pub mod types;


use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::watch::monitor::MonitorSettings;

use loader::ConfigLoader;
use types::{CommitConfig, GitConfig, GlobalConfig, OpenConfig, WatchConfig};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Global options.
    pub global: GlobalConfig,
    /// Watched file and monitor timings.
    pub watch: WatchConfig,
    /// Git executable.
    pub git: GitConfig,
    /// Automatic commits.
    pub commit: CommitConfig,
    /// File opener.
    pub open: OpenConfig,
}

impl Config {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use gitsentry::config::Config;
    ///
    /// let config = Config::builder()
    ///     .add_toml_file_optional("gitsentry.toml")
    ///     .with_env_prefix("GITSENTRY")
    ///     .build()?;
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    #[must_use]
    pub fn builder() -> ConfigLoader {
        ConfigLoader::new()
    }

    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// does not match the `Config` structure.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::builder().add_toml_file(path).build()
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML, does not match the
    /// `Config` structure or fails validation.
    pub fn parse(content: &str) -> Result<Self> {
        Self::builder().add_toml_str(content).build()
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero timing or a relative
    /// `watch.file`.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let positive = [
            ("debounce_ms", self.watch.debounce_ms),
            ("lock_timeout_secs", self.watch.lock_timeout_secs),
            ("lock_poll_ms", self.watch.lock_poll_ms),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(invalid("watch", key, "must be greater than zero"));
            }
        }

        if let Some(file) = &self.watch.file
            && !file.is_absolute()
        {
            return Err(invalid(
                "watch",
                "file",
                &format!("'{}' is not an absolute path", file.display()),
            ));
        }

        if self.git.executable.trim().is_empty() {
            return Err(invalid("git", "executable", "must not be empty"));
        }
        if self.git.command_timeout_secs == Some(0) {
            return Err(invalid("git", "command_timeout_secs", "must be greater than zero"));
        }
        Ok(())
    }

    /// The watched file, or `MissingKey` when none is configured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingKey` if `watch.file` is unset.
    pub fn watch_file(&self) -> std::result::Result<&Path, ConfigError> {
        self.watch
            .file
            .as_deref()
            .ok_or_else(|| ConfigError::MissingKey {
                section: "watch".to_string(),
                key: "file".to_string(),
            })
    }

    /// Monitor timings from `[watch]`.
    #[must_use]
    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings::builder()
            .with_debounce(self.watch.debounce())
            .with_lock_timeout(self.watch.lock_timeout())
            .with_lock_poll(self.watch.lock_poll())
            .build()
    }

    /// Format configuration options for display.
    ///
    /// One `key = value` line per option, sorted by key.
    #[must_use]
    pub fn format_options(&self) -> Vec<String> {
        let mut options = BTreeMap::new();
        self.format_global_options(&mut options);
        self.format_watch_options(&mut options);
        self.format_git_options(&mut options);
        self.format_commit_options(&mut options);
        options.insert(
            "open.command".into(),
            self.open.command.clone().unwrap_or_default(),
        );

        let max_key_len = options.keys().map(String::len).max().unwrap_or(0);

        options
            .into_iter()
            .map(|(key, value)| format!("{key:<max_key_len$} = {value}"))
            .collect()
    }

    fn format_global_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "global.log_level".into(),
            self.global.log_level.as_u8().to_string(),
        );
        options.insert(
            "global.file_log_level".into(),
            self.global.file_log_level.as_u8().to_string(),
        );
        options.insert("global.log_file".into(), fmt_path(self.global.log_file.as_ref()));
    }

    fn format_watch_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert("watch.file".into(), fmt_path(self.watch.file.as_ref()));
        options.insert(
            "watch.debounce_ms".into(),
            self.watch.debounce_ms.to_string(),
        );
        options.insert(
            "watch.lock_timeout_secs".into(),
            self.watch.lock_timeout_secs.to_string(),
        );
        options.insert(
            "watch.lock_poll_ms".into(),
            self.watch.lock_poll_ms.to_string(),
        );
    }

    fn format_git_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert("git.executable".into(), self.git.executable.clone());
        options.insert(
            "git.command_timeout_secs".into(),
            self.git
                .command_timeout_secs
                .map_or_else(String::new, |secs| secs.to_string()),
        );
    }

    fn format_commit_options(&self, options: &mut BTreeMap<String, String>) {
        options.insert(
            "commit.auto_commit".into(),
            self.commit.auto_commit.to_string(),
        );
        options.insert("commit.message".into(), self.commit.message.clone());
        options.insert(
            "commit.push_after_commit".into(),
            self.commit.push_after_commit.to_string(),
        );
    }
}

fn invalid(section: &str, key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn fmt_path(path: Option<&PathBuf>) -> String {
    path.map_or_else(String::new, |p| p.display().to_string())
}
