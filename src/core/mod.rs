// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Core modules.
//!
//! ```text
//!     core
//!      |
//!      v
//!   process
//!      |
//!   Builder  Output
//!   (tokio::process)
//! ```

pub mod process;
