// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for gitsentry using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! gitsentry [global options] <command>
//! version | options | config-files
//! watch [--auto-commit] [--push]
//! status
//! pull [--open]
//! commit -m MSG [--push]
//! push
//! ```

pub mod global;
pub mod repo;


use crate::cli::global::GlobalOptions;
use crate::cli::repo::{CommitArgs, PullArgs, WatchArgs};
use clap::{Parser, Subcommand};

/// Single-file git watcher.
#[derive(Debug, Parser)]
#[command(
    name = "gitsentry",
    author,
    version,
    about = "Single-File Git Watcher",
    long_about = "gitsentry Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Watches one file inside a git work tree, reports when an editor\n\
                  has finished writing real changes to it, and runs status, pull,\n\
                  commit and push against it one at a time.",
    after_help = "CONFIG FILES:\n\n\
                  gitsentry reads `gitsentry.toml` from the current directory if it\n\
                  exists. Additional files can be given with --config; later files\n\
                  override earlier ones. GITSENTRY_<SECTION>__<KEY> environment\n\
                  variables and --set override every file."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    Version,

    /// Lists all options and their effective values.
    Options,

    /// Lists the config files that were loaded.
    #[command(name = "config-files")]
    ConfigFiles,

    /// Watches the file until interrupted.
    Watch(WatchArgs),

    /// Shows whether the file has uncommitted changes.
    Status,

    /// Fast-forward pull, refused while the file has local changes.
    Pull(PullArgs),

    /// Stages and commits the file.
    Commit(CommitArgs),

    /// Pushes the current branch.
    Push,
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments from an iterator.
pub fn parse_from<I, T>(iter: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::parse_from(iter)
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version
/// information was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
