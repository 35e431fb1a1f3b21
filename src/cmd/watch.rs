// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The `watch` command.
//!
//! ```text
//! resolve target --> WatchSession::start
//!        |
//!        v
//! loop select {
//!   Ctrl-C           --> stop
//!   ChangesDetected  --> print | auto-commit (+push)
//!   Warning          --> already logged; JSON line in --json mode
//! }
//! ```

use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{git_runner, render, report, resolve_target};
use crate::cli::repo::WatchArgs;
use crate::config::Config;
use crate::error::Result;
use crate::watch::monitor::MonitorEvent;
use crate::watch::session::WatchSession;
use crate::watch::suppress::SuppressionGate;

/// Runs the monitor until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the target is invalid or the watch cannot be
/// attached.
pub async fn run_watch_command(args: &WatchArgs, config: &Config, json: bool) -> Result<ExitCode> {
    let target = resolve_target(config)?;
    let auto_commit = args.auto_commit || config.commit.auto_commit;
    let push = args.push || config.commit.push_after_commit;

    let mut session = WatchSession::new(
        target,
        git_runner(config),
        SuppressionGate::new(),
        config.monitor_settings(),
    );
    session.start()?;
    info!(auto_commit, push, "press Ctrl-C to stop");

    let shutdown = CancellationToken::new();
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        tokio::select! {
            res = &mut interrupted => {
                if let Err(e) = res {
                    warn!(error = %e, "unable to listen for Ctrl-C");
                }
                break;
            }
            event = session.next_event() => {
                let Some(event) = event else { break };
                handle_event(&session, &event, auto_commit, push, config, json, &shutdown).await?;
            }
        }
    }

    shutdown.cancel();
    session.stop();
    Ok(ExitCode::SUCCESS)
}

async fn handle_event(
    session: &WatchSession,
    event: &MonitorEvent,
    auto_commit: bool,
    push: bool,
    config: &Config,
    json: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    match event {
        MonitorEvent::ChangesDetected { path } => {
            let plain = format!("Changes detected in {}", path.display());
            println!("{}", render(event, &plain, json)?);
            if auto_commit {
                let message = config.commit.render_message(session.target().relative());
                let result = session.operations().commit(&message, push, cancel).await;
                report(&result, json)?;
            }
        }
        MonitorEvent::Warning { .. } => {
            if json {
                println!("{}", serde_json::to_string(event)?);
            }
        }
    }
    Ok(())
}
