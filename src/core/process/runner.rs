// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Spawning and exit-code validation.
//!
//! ```text
//! run_with_cancellation(token)
//!   token already cancelled? --> interrupted, nothing spawned
//!   spawn (stdin null, kill_on_drop)
//!   run_child: wait | cancel (kill) | timeout (kill, error)
//!   exit != 0 && !ALLOW_FAILURE && !interrupted --> error
//! ```

use crate::error::{ProcessError, Result};
use std::fmt::Write as _;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use super::builder::{ProcessBuilder, ProcessFlags, ProcessOutput, StreamFlags};

impl ProcessBuilder {
    fn display_name(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        self.program
            .file_stem()
            .map_or_else(|| "process".to_string(), |s| s.to_string_lossy().into_owned())
    }

    /// The command line for logging; arguments with spaces are quoted.
    pub(crate) fn command_line(&self) -> String {
        let mut cmd = self.program.display().to_string();
        for arg in &self.args {
            if arg.contains(' ') {
                let _ = write!(cmd, " \"{arg}\"");
            } else {
                let _ = write!(cmd, " {arg}");
            }
        }
        cmd
    }

    /// Runs the process to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned, exceeds its
    /// timeout, or exits non-zero without `ALLOW_FAILURE`.
    pub async fn run(self) -> Result<ProcessOutput> {
        self.run_with_cancellation(CancellationToken::new()).await
    }

    /// Runs the process, killing it when `token` fires.
    ///
    /// A cancelled run returns `Ok` with [`ProcessOutput::is_interrupted`]
    /// set; a token that is already cancelled prevents the spawn.
    ///
    /// # Errors
    ///
    /// Same as [`ProcessBuilder::run`].
    pub async fn run_with_cancellation(self, token: CancellationToken) -> Result<ProcessOutput> {
        if token.is_cancelled() {
            return Ok(ProcessOutput::interrupted());
        }

        let name = self.display_name();
        let cmd_line = self.command_line();
        debug!(cmd = %cmd_line, cwd = ?self.cwd, "exec");

        let mut child = self
            .build_command()
            .spawn()
            .map_err(|source| ProcessError::SpawnFailed {
                command: cmd_line.clone(),
                source,
            })?;
        trace!(process = %name, pid = ?child.id(), "spawned");

        let output = self.run_child(&name, &cmd_line, &mut child, token).await?;

        if !output.is_interrupted()
            && output.exit_code() != 0
            && !self.flags.contains(ProcessFlags::ALLOW_FAILURE)
        {
            if !output.stderr().is_empty() {
                error!(process = %name, stderr = %output.stderr(), "process error output");
            }
            anyhow::bail!("{name} exited with code {}", output.exit_code());
        }

        trace!(
            process = %name,
            exit_code = output.exit_code(),
            interrupted = output.is_interrupted(),
            "completed"
        );
        Ok(output)
    }

    fn build_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command.envs(self.env.iter().map(|(k, v)| (k, v)));
        command
            .stdin(Stdio::null())
            .stdout(stdio(self.stdout))
            .stderr(stdio(self.stderr))
            .kill_on_drop(true);
        command
    }
}

fn stdio(flags: StreamFlags) -> Stdio {
    if flags.contains(StreamFlags::BIT_BUCKET) {
        Stdio::null()
    } else {
        Stdio::piped()
    }
}
