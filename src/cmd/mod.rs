// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Command implementations.
//!
//! ```text
//! CLI args --> cmd::run_* handlers --> ExitCode
//!   config (options, config-files)
//!   repo   (status, pull, commit, push)
//!   watch
//! ```

pub mod config;
pub mod repo;
pub mod watch;


use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::git::outcome::OperationResult;
use crate::git::runner::{CommandRunner, ShellRunner};
use crate::git::target::WatchTarget;

/// Validated target from `watch.file`.
///
/// # Errors
///
/// Returns an error if `watch.file` is unset, invalid, or not inside a git
/// work tree.
pub fn resolve_target(config: &Config) -> Result<WatchTarget> {
    let target = WatchTarget::new(config.watch_file()?)?;
    target.ensure_repository()?;
    Ok(target)
}

/// Git runner configured from `[git]`.
#[must_use]
pub fn git_runner(config: &Config) -> Arc<dyn CommandRunner> {
    Arc::new(ShellRunner::new(&config.git.executable).with_timeout(config.git.command_timeout()))
}

/// Renders one result line, plain or JSON.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized.
pub fn render<T: Serialize>(value: &T, plain: &str, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string(value)?)
    } else {
        Ok(plain.to_string())
    }
}

/// Prints an [`OperationResult`] and maps it to the exit code.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn report(result: &OperationResult, json: bool) -> Result<ExitCode> {
    let line = render(result, result.message(), json)?;
    if result.success() || json {
        println!("{line}");
    } else {
        eprintln!("{line}");
    }
    Ok(if result.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
