// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> config --> Logging --> Command Dispatch
//!   Version | Options | ConfigFiles | Watch | Status | Pull | Commit | Push
//! ```

use std::process::ExitCode;

use gitsentry::cli::global::GlobalOptions;
use gitsentry::cli::{self, Command};
use gitsentry::cmd::config::{run_config_files_command, run_options_command};
use gitsentry::cmd::repo::{
    run_commit_command, run_pull_command, run_push_command, run_status_command,
};
use gitsentry::cmd::watch::run_watch_command;
use gitsentry::config::Config;
use gitsentry::config::loader::{ConfigLoader, DEFAULT_CONFIG_FILE};
use gitsentry::error::Result;
use gitsentry::logging::{ConsoleFormat, LogConfig, LogGuard, init_logging};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    match dispatch_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn build_log_config(config: &Config, json: bool) -> LogConfig {
    LogConfig::builder()
        .with_console_level(config.global.log_level)
        .with_console_format(ConsoleFormat::for_json_output(json))
        .with_file_level(config.global.file_log_level)
        .maybe_with_log_file(config.global.log_file.clone())
        .build()
}

fn start_logging(config: &Config, json: bool) -> Result<LogGuard> {
    init_logging(&build_log_config(config, json))
        .map_err(|e| e.context("failed to initialize logging"))
}

async fn dispatch_command(cli: &cli::Cli) -> Result<ExitCode> {
    let json = cli.global.json;
    let Some(command) = &cli.command else {
        eprintln!("No command specified. Use --help for usage information.");
        return Ok(ExitCode::FAILURE);
    };

    if let Command::Version = command {
        handle_version_command();
        return Ok(ExitCode::SUCCESS);
    }

    let loader = build_config_loader(&cli.global)?;
    if let Command::ConfigFiles = command {
        run_config_files_command(&loader.format_loaded_files());
        return Ok(ExitCode::SUCCESS);
    }

    let config = loader.build().map_err(|e| e.context("failed to load config"))?;
    let _log_guard = start_logging(&config, json)?;

    match command {
        Command::Options => {
            run_options_command(&config);
            Ok(ExitCode::SUCCESS)
        }
        Command::Watch(args) => run_watch_command(args, &config, json).await,
        Command::Status => run_status_command(&config, json).await,
        Command::Pull(args) => run_pull_command(args, &config, json).await,
        Command::Commit(args) => run_commit_command(args, &config, json).await,
        Command::Push => run_push_command(&config, json).await,
        Command::Version | Command::ConfigFiles => Ok(ExitCode::SUCCESS),
    }
}

fn handle_version_command() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

fn build_config_loader(global: &GlobalOptions) -> Result<ConfigLoader> {
    let mut loader = ConfigLoader::new().add_toml_file_optional(DEFAULT_CONFIG_FILE);
    for path in &global.configs {
        loader = loader.add_toml_file(path);
    }
    loader = loader.with_env_prefix("GITSENTRY");
    for option in global.to_config_overrides() {
        loader = loader.set_str(&option)?;
    }
    Ok(loader)
}
