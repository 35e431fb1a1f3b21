// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::ops::{CANCELLED_MESSAGE, EMPTY_MESSAGE, GitOperations};
use super::outcome::{CommandOutcome, OperationResult};
use super::runner::{CommandRunner, ExitCheck, ShellRunner};
use super::target::WatchTarget;
use super::test_utils::ScriptedRunner;
use crate::error::{GitError, SentryError};

fn target() -> Arc<WatchTarget> {
    #[cfg(windows)]
    let path = r"C:\work\workbook.xlsx";
    #[cfg(not(windows))]
    let path = "/work/workbook.xlsx";
    Arc::new(WatchTarget::new(path).expect("valid target"))
}

fn operations(runner: &Arc<ScriptedRunner>) -> GitOperations {
    GitOperations::new(target(), Arc::clone(runner) as Arc<dyn CommandRunner>)
}

fn token() -> CancellationToken {
    CancellationToken::new()
}

// =============================================================================
// CommandOutcome / OperationResult
// =============================================================================

#[test]
fn test_summary_prefers_stderr() {
    let outcome = CommandOutcome::new(1, "out\n".into(), "  fatal: boom \n".into(), false);
    insta::assert_snapshot!(outcome.summary(), @"fatal: boom");
}

#[test]
fn test_summary_falls_back_to_stdout_then_exit_code() {
    let with_stdout = CommandOutcome::new(0, "Already up to date.\n".into(), " \n".into(), true);
    assert_eq!(with_stdout.summary(), "Already up to date.");

    let silent = CommandOutcome::new(128, String::new(), String::new(), false);
    insta::assert_snapshot!(silent.summary(), @"exit code 128");
}

#[test]
fn test_launch_failed_outcome() {
    let outcome = CommandOutcome::launch_failed("No such file or directory");
    assert_eq!(outcome.exit_code(), -1);
    assert!(!outcome.success());
    assert_eq!(outcome.summary(), "No such file or directory");
}

#[test]
fn test_exit_check_classification() {
    assert!(ExitCheck::Classify.classify(0));
    assert!(!ExitCheck::Classify.classify(1));
    assert!(ExitCheck::Ignore.classify(1));
    assert!(ExitCheck::Ignore.classify(-1));
}

#[test]
fn test_operation_result_json() {
    let result = OperationResult::failed("Push failed: rejected");
    let json = serde_json::to_string(&result).expect("serializable");
    insta::assert_snapshot!(json, @r#"{"success":false,"message":"Push failed: rejected"}"#);
}

// =============================================================================
// WatchTarget
// =============================================================================

#[test]
fn test_target_derives_root_and_pathspec() {
    let target = target();
    assert_eq!(target.relative(), "workbook.xlsx");
    assert_eq!(target.repo_root(), target.file().parent().expect("parent"));
}

#[test]
fn test_target_rejects_relative_path() {
    let err = WatchTarget::new("books/workbook.xlsx").expect_err("relative path");
    let SentryError::Git(git) = err else {
        panic!("expected git error");
    };
    assert!(matches!(*git, GitError::InvalidTarget { .. }));
}

#[test]
fn test_target_rejects_root() {
    #[cfg(windows)]
    let root = r"C:\";
    #[cfg(not(windows))]
    let root = "/";
    assert!(WatchTarget::new(root).is_err());
}

fn git_init(dir: &Path) -> bool {
    std::process::Command::new("git")
        .args(["init", "--quiet"])
        .current_dir(dir)
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[test]
fn test_target_repository_discovery() {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let file: PathBuf = temp.path().join("workbook.xlsx");
    let target = WatchTarget::new(&file).expect("valid target");

    assert!(target.ensure_repository().is_err());

    assert!(git_init(temp.path()), "git init failed");
    target
        .ensure_repository()
        .expect("initialized directory is a repository");
}

// =============================================================================
// ShellRunner
// =============================================================================

#[tokio::test]
async fn test_shell_runner_launch_failure() {
    let runner = ShellRunner::new("/nonexistent/bin/git-12345");
    let temp = tempfile::tempdir().expect("failed to create temp dir");

    let outcome = runner
        .run(temp.path(), &["status"], ExitCheck::Ignore, &token())
        .await;

    assert_eq!(outcome.exit_code(), -1);
    assert!(!outcome.success(), "launch failure is never a success");
    assert!(!outcome.stderr().is_empty());
}

#[tokio::test]
async fn test_shell_runner_cancelled_token_spawns_nothing() {
    let runner = ShellRunner::new("/nonexistent/bin/git-12345");
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let cancel = token();
    cancel.cancel();

    let outcome = runner
        .run(temp.path(), &["status"], ExitCheck::Ignore, &cancel)
        .await;

    assert!(outcome.is_interrupted(), "launch was attempted: {}", outcome.summary());
    assert!(!outcome.success());
    assert_eq!(outcome.exit_code(), -1);
}

// =============================================================================
// has_pending_changes
// =============================================================================

#[tokio::test]
async fn test_pending_changes_detected() {
    let runner = Arc::new(ScriptedRunner::new().respond("status", 0, " M workbook.xlsx\n", ""));
    let ops = operations(&runner);

    assert!(ops.has_pending_changes(&token()).await.expect("status ok"));
    assert_eq!(
        runner.call_args(),
        vec!["status --porcelain -- workbook.xlsx"]
    );
}

#[tokio::test]
async fn test_whitespace_status_is_clean() {
    let runner = Arc::new(ScriptedRunner::new().respond("status", 0, "\n  \n", ""));
    let ops = operations(&runner);

    assert!(!ops.has_pending_changes(&token()).await.expect("status ok"));
}

#[tokio::test]
async fn test_status_failure_is_an_error() {
    let runner = Arc::new(ScriptedRunner::new().respond(
        "status",
        128,
        "",
        "fatal: not a git repository",
    ));
    let ops = operations(&runner);

    let err = ops
        .has_pending_changes(&token())
        .await
        .expect_err("failed status must not read as clean");
    assert!(err.to_string().contains("fatal: not a git repository"));
}

#[tokio::test]
async fn test_cancelled_before_gate_runs_nothing() {
    let runner = Arc::new(ScriptedRunner::new());
    let ops = operations(&runner);
    let cancel = token();
    cancel.cancel();

    let err = ops.has_pending_changes(&cancel).await.expect_err("cancelled");
    assert!(err.is_cancelled());
    assert_eq!(ops.push(&cancel).await.message(), CANCELLED_MESSAGE);
    assert!(runner.calls().is_empty());
}

// =============================================================================
// pull
// =============================================================================

#[tokio::test]
async fn test_pull_refused_with_local_changes() {
    let runner = Arc::new(ScriptedRunner::new().respond("status", 0, " M workbook.xlsx\n", ""));
    let ops = operations(&runner);

    let result = ops.pull(&token()).await;

    assert!(!result.success());
    assert!(result.message().contains("local or staged changes"));
    assert_eq!(
        runner.call_args(),
        vec!["status --porcelain -- workbook.xlsx"],
        "pull must not be invoked"
    );
}

#[tokio::test]
async fn test_pull_fast_forward() {
    let runner = Arc::new(ScriptedRunner::new().respond("pull", 0, "Already up to date.\n", ""));
    let ops = operations(&runner);

    let result = ops.pull(&token()).await;

    assert!(result.success());
    insta::assert_snapshot!(result.message(), @"Pull completed: Already up to date.");
    assert_eq!(
        runner.call_args(),
        vec!["status --porcelain -- workbook.xlsx", "pull --ff-only"]
    );
}

#[tokio::test]
async fn test_pull_failure_reports_summary() {
    let runner = Arc::new(ScriptedRunner::new().respond(
        "pull",
        128,
        "",
        "fatal: Not possible to fast-forward, aborting.",
    ));
    let ops = operations(&runner);

    let result = ops.pull(&token()).await;

    assert!(!result.success());
    insta::assert_snapshot!(
        result.message(),
        @"Pull failed: fatal: Not possible to fast-forward, aborting."
    );
}

// =============================================================================
// commit
// =============================================================================

#[tokio::test]
async fn test_commit_blank_message_runs_nothing() {
    let runner = Arc::new(ScriptedRunner::new());
    let ops = operations(&runner);

    for message in ["", "  ", "\t\n"] {
        let result = ops.commit(message, true, &token()).await;
        assert!(!result.success());
        insta::allow_duplicates! {
            insta::assert_snapshot!(result.message(), @"Commit message cannot be empty.");
        }
    }
    assert_eq!(EMPTY_MESSAGE, "Commit message cannot be empty.");
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn test_commit_nothing_staged() {
    let runner = Arc::new(ScriptedRunner::new().respond("diff", 0, "", ""));
    let ops = operations(&runner);

    let result = ops.commit("Update budget", false, &token()).await;

    assert!(!result.success());
    assert!(result.message().contains("nothing to commit"));
    assert_eq!(
        runner.call_args(),
        vec!["add -- workbook.xlsx", "diff --cached --quiet"]
    );
}

#[tokio::test]
async fn test_commit_with_staged_changes() {
    let runner = Arc::new(ScriptedRunner::new().respond("diff", 1, "", ""));
    let ops = operations(&runner);

    let result = ops.commit("  Update budget  ", false, &token()).await;

    assert!(result.success());
    insta::assert_snapshot!(result.message(), @"Commit completed.");
    assert_eq!(
        runner.call_args(),
        vec![
            "add -- workbook.xlsx",
            "diff --cached --quiet",
            "commit -m Update budget",
        ]
    );
}

#[tokio::test]
async fn test_commit_ambiguous_probe() {
    let runner = Arc::new(ScriptedRunner::new().respond(
        "diff",
        128,
        "",
        "fatal: bad revision 'HEAD'",
    ));
    let ops = operations(&runner);

    let result = ops.commit("Update budget", true, &token()).await;

    assert!(!result.success());
    insta::assert_snapshot!(
        result.message(),
        @"Unable to check staged changes: fatal: bad revision 'HEAD'"
    );
    assert!(
        !runner.call_args().iter().any(|c| c.starts_with("commit")),
        "commit must never run after an ambiguous probe"
    );
}

#[tokio::test]
async fn test_commit_staging_failure() {
    let runner = Arc::new(ScriptedRunner::new().respond(
        "add",
        128,
        "",
        "fatal: pathspec 'workbook.xlsx' did not match any files",
    ));
    let ops = operations(&runner);

    let result = ops.commit("Update budget", false, &token()).await;

    assert!(!result.success());
    assert!(result.message().starts_with("Staging failed:"));
    assert_eq!(runner.call_args(), vec!["add -- workbook.xlsx"]);
}

#[tokio::test]
async fn test_commit_failure() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .respond("diff", 1, "", "")
            .respond("commit", 1, "", "Author identity unknown"),
    );
    let ops = operations(&runner);

    let result = ops.commit("Update budget", true, &token()).await;

    assert!(!result.success());
    insta::assert_snapshot!(result.message(), @"Commit failed: Author identity unknown");
    assert!(!runner.call_args().iter().any(|c| c == "push"));
}

#[tokio::test]
async fn test_commit_and_push() {
    let runner = Arc::new(ScriptedRunner::new().respond("diff", 1, "", ""));
    let ops = operations(&runner);

    let result = ops.commit("Update budget", true, &token()).await;

    assert!(result.success());
    insta::assert_snapshot!(result.message(), @"Commit and push completed.");
    assert_eq!(runner.call_args().last().map(String::as_str), Some("push"));
}

#[tokio::test]
async fn test_commit_succeeded_but_push_failed() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .respond("diff", 1, "", "")
            .respond("push", 1, "", "rejected: non-fast-forward"),
    );
    let ops = operations(&runner);

    let result = ops.commit("Update budget", true, &token()).await;

    assert!(!result.success());
    assert!(result.message().contains("Commit succeeded"));
    assert!(result.message().contains("push failed"));
    assert!(result.message().contains("rejected: non-fast-forward"));
}

// =============================================================================
// push
// =============================================================================

#[tokio::test]
async fn test_push_reports_summary() {
    let runner = Arc::new(ScriptedRunner::new().respond("push", 0, "", "Everything up-to-date"));
    let ops = operations(&runner);

    let result = ops.push(&token()).await;

    assert!(result.success());
    insta::assert_snapshot!(result.message(), @"Push completed: Everything up-to-date");
}

// =============================================================================
// Cancellation of a running command
// =============================================================================

/// Starts `commit` with push on a runner where every command takes 500ms,
/// and cancels it `after` into the sequence.
async fn commit_cancelled_after(after: Duration) -> (Arc<ScriptedRunner>, OperationResult) {
    let runner = Arc::new(
        ScriptedRunner::new()
            .with_delay(Duration::from_millis(500))
            .respond("diff", 1, "", ""),
    );
    let ops = Arc::new(operations(&runner));
    let cancel = token();

    let task = {
        let ops = Arc::clone(&ops);
        let cancel = cancel.clone();
        tokio::spawn(async move { ops.commit("Update budget", true, &cancel).await })
    };
    tokio::time::sleep(after).await;
    cancel.cancel();
    let result = task.await.expect("commit task");
    (runner, result)
}

#[tokio::test(start_paused = true)]
async fn test_commit_cancelled_while_committing() {
    let (runner, result) = commit_cancelled_after(Duration::from_millis(1200)).await;

    assert!(!result.success());
    assert_eq!(result.message(), CANCELLED_MESSAGE);
    assert_eq!(
        runner.call_args(),
        vec![
            "add -- workbook.xlsx",
            "diff --cached --quiet",
            "commit -m Update budget",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_push_after_commit_cancelled() {
    let (runner, result) = commit_cancelled_after(Duration::from_millis(1700)).await;

    assert!(!result.success());
    insta::assert_snapshot!(result.message(), @"Commit succeeded, but push was cancelled.");
    assert_eq!(runner.call_args().last().map(String::as_str), Some("push"));
}

#[tokio::test(start_paused = true)]
async fn test_pull_cancelled_during_status_never_pulls() {
    let runner = Arc::new(ScriptedRunner::new().with_delay(Duration::from_millis(500)));
    let ops = Arc::new(operations(&runner));
    let cancel = token();

    let task = {
        let ops = Arc::clone(&ops);
        let cancel = cancel.clone();
        tokio::spawn(async move { ops.pull(&cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;
    cancel.cancel();

    let result = task.await.expect("pull task");
    assert_eq!(result.message(), CANCELLED_MESSAGE);
    assert_eq!(
        runner.call_args(),
        vec!["status --porcelain -- workbook.xlsx"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_status_cancelled_mid_query_is_cancelled() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .with_delay(Duration::from_millis(500))
            .respond("status", 0, " M workbook.xlsx\n", ""),
    );
    let ops = Arc::new(operations(&runner));
    let cancel = token();

    let task = {
        let ops = Arc::clone(&ops);
        let cancel = cancel.clone();
        tokio::spawn(async move { ops.has_pending_changes(&cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(200)).await;
    cancel.cancel();

    let err = task
        .await
        .expect("status task")
        .expect_err("interrupted status must not report a result");
    assert!(err.is_cancelled());
}

// =============================================================================
// Serialization
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operations_never_interleave() {
    let runner = Arc::new(
        ScriptedRunner::new()
            .with_delay(Duration::from_millis(20))
            .respond("diff", 1, "", ""),
    );
    let ops = Arc::new(operations(&runner));

    let commit = {
        let ops = Arc::clone(&ops);
        tokio::spawn(async move { ops.commit("Update budget", false, &token()).await })
    };
    let pull = {
        let ops = Arc::clone(&ops);
        tokio::spawn(async move { ops.pull(&token()).await })
    };
    let status = {
        let ops = Arc::clone(&ops);
        tokio::spawn(async move { ops.has_pending_changes(&token()).await })
    };

    let (commit, pull, status) = tokio::join!(commit, pull, status);
    assert!(commit.expect("commit task").success());
    assert!(pull.expect("pull task").success());
    assert!(!status.expect("status task").expect("status ok"));

    assert!(!runner.overlapped(), "two git commands ran at the same time");

    let calls = runner.call_args();
    assert_eq!(calls.len(), 6);
    let commit_sequence = [
        "add -- workbook.xlsx",
        "diff --cached --quiet",
        "commit -m Update budget",
    ];
    let start = calls
        .iter()
        .position(|c| c == commit_sequence[0])
        .expect("commit sequence ran");
    assert_eq!(&calls[start..start + 3], &commit_sequence);
    let pull_at = calls
        .iter()
        .position(|c| c == "pull --ff-only")
        .expect("pull ran");
    assert_eq!(calls[pull_at - 1], "status --porcelain -- workbook.xlsx");
}
