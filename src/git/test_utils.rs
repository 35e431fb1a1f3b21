// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Scripted in-memory command runner for tests.
//!
//! Answers each git subcommand with a canned outcome and records every
//! invocation, so tests can assert on exact argument sequences.

use futures_util::future::BoxFuture;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::outcome::CommandOutcome;
use super::runner::{CommandRunner, ExitCheck};

/// One recorded invocation.
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub(crate) args: String,
    pub(crate) at: tokio::time::Instant,
}

#[derive(Default)]
pub(crate) struct ScriptedRunner {
    responses: Mutex<HashMap<String, (i32, String, String)>>,
    calls: Mutex<Vec<Call>>,
    delay: Duration,
    in_flight: AtomicUsize,
    overlapped: AtomicBool,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every invocation takes `delay` before answering.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Scripts the answer for a subcommand (first argument).
    pub(crate) fn respond(self, subcommand: &str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        self.responses
            .lock()
            .expect("responses poisoned")
            .insert(
                subcommand.to_string(),
                (exit_code, stdout.to_string(), stderr.to_string()),
            );
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls poisoned").clone()
    }

    pub(crate) fn call_args(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.args).collect()
    }

    /// True if two invocations were ever running at the same time.
    pub(crate) fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }
}

impl CommandRunner for ScriptedRunner {
    fn run<'a>(
        &'a self,
        _repo_root: &'a Path,
        args: &'a [&'a str],
        check: ExitCheck,
        cancel: &'a CancellationToken,
    ) -> BoxFuture<'a, CommandOutcome> {
        Box::pin(async move {
            if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            self.calls.lock().expect("calls poisoned").push(Call {
                args: args.join(" "),
                at: tokio::time::Instant::now(),
            });

            let interrupted = tokio::select! {
                biased;
                () = cancel.cancelled() => true,
                () = tokio::time::sleep(self.delay) => false,
            };
            if interrupted {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                return CommandOutcome::interrupted();
            }

            let (exit_code, stdout, stderr) = args
                .first()
                .and_then(|sub| {
                    self.responses
                        .lock()
                        .expect("responses poisoned")
                        .get(*sub)
                        .cloned()
                })
                .unwrap_or_default();

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            CommandOutcome::new(exit_code, stdout, stderr, check.classify(exit_code))
        })
    }
}
