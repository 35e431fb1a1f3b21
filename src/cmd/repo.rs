// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! One-shot repository commands: status, pull, commit, push.

use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{git_runner, render, report, resolve_target};
use crate::cli::repo::{CommitArgs, PullArgs};
use crate::config::Config;
use crate::error::Result;
use crate::git::ops::GitOperations;
use crate::watch::session::{CommandOpener, WatchSession};
use crate::watch::suppress::SuppressionGate;

/// JSON shape of the `status` command.
#[derive(Debug, Serialize)]
pub struct StatusReport<'a> {
    pub path: &'a Path,
    pub pending_changes: bool,
}

fn operations(config: &Config) -> Result<GitOperations> {
    let target = resolve_target(config)?;
    Ok(GitOperations::new(Arc::new(target), git_runner(config)))
}

/// Cancels `token` on Ctrl-C.
fn cancel_on_interrupt(token: &CancellationToken) {
    let token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received");
            token.cancel();
        }
    });
}

/// # Errors
///
/// Returns an error if the target is invalid or the status query fails.
pub async fn run_status_command(config: &Config, json: bool) -> Result<ExitCode> {
    let ops = operations(config)?;
    let cancel = CancellationToken::new();
    cancel_on_interrupt(&cancel);

    let pending = ops.has_pending_changes(&cancel).await?;
    let target = ops.target();
    let plain = if pending {
        format!("{}: pending changes", target.relative())
    } else {
        format!("{}: clean", target.relative())
    };
    let report = StatusReport {
        path: target.file(),
        pending_changes: pending,
    };
    println!("{}", render(&report, &plain, json)?);
    Ok(ExitCode::SUCCESS)
}

/// # Errors
///
/// Returns an error if the target is invalid.
pub async fn run_pull_command(args: &PullArgs, config: &Config, json: bool) -> Result<ExitCode> {
    let cancel = CancellationToken::new();
    cancel_on_interrupt(&cancel);

    let result = if args.open {
        let session = WatchSession::new(
            resolve_target(config)?,
            git_runner(config),
            SuppressionGate::new(),
            config.monitor_settings(),
        );
        let opener = config
            .open
            .command
            .as_deref()
            .map_or_else(CommandOpener::platform_default, CommandOpener::new);
        session.pull_and_open(&opener, &cancel).await
    } else {
        operations(config)?.pull(&cancel).await
    };
    report(&result, json)
}

/// # Errors
///
/// Returns an error if the target is invalid.
pub async fn run_commit_command(
    args: &CommitArgs,
    config: &Config,
    json: bool,
) -> Result<ExitCode> {
    let ops = operations(config)?;
    let cancel = CancellationToken::new();
    cancel_on_interrupt(&cancel);

    let result = ops.commit(&args.message, args.push, &cancel).await;
    report(&result, json)
}

/// # Errors
///
/// Returns an error if the target is invalid.
pub async fn run_push_command(config: &Config, json: bool) -> Result<ExitCode> {
    let ops = operations(config)?;
    let cancel = CancellationToken::new();
    cancel_on_interrupt(&cancel);

    let result = ops.push(&cancel).await;
    report(&result, json)
}
