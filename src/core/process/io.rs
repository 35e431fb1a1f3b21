// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! I/O streaming and output capture for processes.
//!
//! ```text
//! run_child()
//!   stdout/stderr reader tasks (read to EOF)
//!   wait | cancel | timeout
//!   join readers
//!   --> ProcessOutput { stdout, stderr, exit_code, interrupted }
//! ```

use crate::error::{ProcessError, Result};
use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use super::builder::{ProcessBuilder, ProcessOutput, StreamFlags};

/// Spawns a task that drains one stream to completion.
///
/// Output is read whole rather than line by line so that trailing
/// whitespace survives for callers that inspect it.
fn spawn_reader<R>(
    stream: Option<R>,
    flags: StreamFlags,
    process_name: &str,
    stream_name: &'static str,
) -> Option<JoinHandle<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    if !flags.intersects(StreamFlags::FORWARD_TO_LOG | StreamFlags::KEEP_IN_STRING) {
        return None;
    }
    let name = process_name.to_string();
    stream.map(|mut stream| {
        tokio::spawn(async move {
            let mut raw = Vec::new();
            if let Err(e) = stream.read_to_end(&mut raw).await {
                warn!(process = %name, stream = %stream_name, error = %e, "error reading stream");
            }
            let text = String::from_utf8_lossy(&raw).into_owned();
            if flags.contains(StreamFlags::FORWARD_TO_LOG) {
                for line in text.lines() {
                    trace!(process = %name, stream = %stream_name, line = %line, "output");
                }
            }
            if flags.contains(StreamFlags::KEEP_IN_STRING) {
                text
            } else {
                String::new()
            }
        })
    })
}

async fn join_reader(handle: Option<JoinHandle<String>>) -> String {
    match handle {
        Some(handle) => handle.await.unwrap_or_default(),
        None => String::new(),
    }
}

impl ProcessBuilder {
    /// Runs the child process, draining its output and waiting for completion.
    pub(super) async fn run_child(
        &self,
        name: &str,
        cmd_line: &str,
        child: &mut Child,
        token: CancellationToken,
    ) -> Result<ProcessOutput> {
        let stdout_handle = spawn_reader(child.stdout.take(), self.stdout, name, "stdout");
        let stderr_handle = spawn_reader(child.stderr.take(), self.stderr, name, "stderr");

        let timeout = async {
            match self.timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };

        let (exit_status, interrupted) = tokio::select! {
            status = child.wait() => (status?, false),
            () = token.cancelled() => {
                warn!(process = %name, "cancellation requested, terminating process");
                child.kill().await.ok();
                let status = child.wait().await
                    .with_context(|| format!("failed waiting for process {name} to exit"))?;
                (status, true)
            }
            () = timeout => {
                let duration = self.timeout.unwrap_or_default();
                warn!(process = %name, timeout = ?duration, "process timed out");
                child.kill().await.with_context(|| format!("failed to kill process {name}"))?;
                return Err(ProcessError::Timeout {
                    command: cmd_line.to_string(),
                    timeout: duration,
                }
                .into());
            }
        };

        let stdout = join_reader(stdout_handle).await;
        let stderr = join_reader(stderr_handle).await;

        Ok(ProcessOutput::new(
            exit_status.code().unwrap_or(-1),
            stdout,
            stderr,
            interrupted,
        ))
    }
}
