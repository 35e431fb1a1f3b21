// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Watching the target file and deciding when it really changed.
//!
//! ```text
//!                 WatchSession
//!           retarget | pull_and_open
//!                    |
//!       ,------------+-------------,
//!       v                          v
//!  SuppressionGate <------- ChangeMonitor (notify + flume)
//!   (suppress.rs)                  |
//!                        DebounceScheduler (debounce.rs)
//!                                  |
//!                        VerificationPipeline
//!                     LockWaiter (lock.rs) -> GitOperations
//!                                  |
//!                                  v
//!                            MonitorEvent
//! ```

pub mod debounce;
pub mod lock;
pub mod monitor;
pub mod session;
pub mod suppress;
