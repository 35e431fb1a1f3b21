// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git coordination for the watched file.
//!
//! ```text
//!        Public API
//!    ops.rs (GitOperations)
//!   status  pull  commit  push
//!             |
//!       one gate, whole sequence
//!             |
//!             v
//!   ,--------------------,
//!   | runner (trait)     |
//!   '---------+----------'
//!             |
//!             v
//!        ShellRunner --> git CLI
//!             |
//!             v
//!   outcome.rs: CommandOutcome -> OperationResult
//! ```
//!
//! `target` holds the watched file, its repository root and pathspec.

pub mod ops;
pub mod outcome;
pub mod runner;
pub mod target;

#[cfg(test)]
pub(crate) mod test_utils;
#[cfg(test)]
mod tests;
