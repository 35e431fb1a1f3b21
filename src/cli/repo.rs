// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments of the repository commands.

use clap::Args;

/// Arguments for the `watch` command.
#[derive(Debug, Clone, Default, Args)]
pub struct WatchArgs {
    /// Commits every detected change (overrides commit.auto_commit).
    #[arg(long = "auto-commit")]
    pub auto_commit: bool,

    /// Pushes after every automatic commit (overrides commit.push_after_commit).
    #[arg(long)]
    pub push: bool,
}

/// Arguments for the `pull` command.
#[derive(Debug, Clone, Default, Args)]
pub struct PullArgs {
    /// Opens the file after a successful pull.
    #[arg(long)]
    pub open: bool,
}

/// Arguments for the `commit` command.
#[derive(Debug, Clone, Args)]
pub struct CommitArgs {
    /// Commit message.
    #[arg(short = 'm', long, value_name = "MESSAGE")]
    pub message: String,

    /// Pushes after a successful commit.
    #[arg(long)]
    pub push: bool,
}
