// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the git operations.
//!
//! Runs the real git CLI against temporary repositories.

use gitsentry::git::ops::GitOperations;
use gitsentry::git::runner::{CommandRunner, ShellRunner};
use gitsentry::git::target::WatchTarget;
use gitsentry::watch::monitor::{MonitorEvent, MonitorSettings};
use gitsentry::watch::session::WatchSession;
use gitsentry::watch::suppress::SuppressionGate;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

/// Helper to run git commands in a directory
fn run_git(args: &[&str], cwd: &Path) -> bool {
    Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@test.com")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@test.com")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git_stdout(args: &[&str], cwd: &Path) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("git runs");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn init_test_repo(dir: &Path) {
    assert!(run_git(&["init", "-q", "-b", "main"], dir));
    run_git(&["config", "user.email", "test@test.com"], dir);
    run_git(&["config", "user.name", "Test"], dir);
    run_git(&["config", "commit.gpgsign", "false"], dir);
}

/// Repo with `book.txt` committed.
fn init_repo_with_book(dir: &Path) -> std::path::PathBuf {
    init_test_repo(dir);
    let book = dir.join("book.txt");
    fs::write(&book, "v1\n").unwrap();
    assert!(run_git(&["add", "book.txt"], dir));
    assert!(run_git(&["commit", "-q", "-m", "Initial"], dir));
    book
}

fn operations(file: &Path) -> GitOperations {
    let target = WatchTarget::new(file).expect("valid target");
    GitOperations::new(
        Arc::new(target),
        Arc::new(ShellRunner::new("git")) as Arc<dyn CommandRunner>,
    )
}

fn token() -> CancellationToken {
    CancellationToken::new()
}

// =============================================================================
// Pending changes
// =============================================================================

#[tokio::test]
async fn pending_changes_follow_worktree() {
    let dir = temp_dir();
    let book = init_repo_with_book(dir.path());
    let ops = operations(&book);

    assert!(!ops.has_pending_changes(&token()).await.unwrap());

    fs::write(&book, "v2\n").unwrap();
    assert!(ops.has_pending_changes(&token()).await.unwrap());

    fs::write(&book, "v1\n").unwrap();
    assert!(!ops.has_pending_changes(&token()).await.unwrap());
}

#[tokio::test]
async fn untracked_file_counts_as_pending() {
    let dir = temp_dir();
    init_repo_with_book(dir.path());
    let sheet = dir.path().join("sheet.csv");
    fs::write(&sheet, "a,b\n").unwrap();

    let ops = operations(&sheet);
    assert!(ops.has_pending_changes(&token()).await.unwrap());
}

#[tokio::test]
async fn other_files_do_not_count() {
    let dir = temp_dir();
    let book = init_repo_with_book(dir.path());
    fs::write(dir.path().join("notes.txt"), "scratch\n").unwrap();

    let ops = operations(&book);
    assert!(!ops.has_pending_changes(&token()).await.unwrap());
}

#[tokio::test]
async fn status_outside_repository_fails() {
    let dir = temp_dir();
    let file = dir.path().join("loose.txt");
    fs::write(&file, "x\n").unwrap();

    let ops = operations(&file);
    let err = ops.has_pending_changes(&token()).await.unwrap_err();
    assert!(err.to_string().contains("unable to query status"), "{err}");
}

#[test]
fn ensure_repository_detects_work_tree() {
    let repo = temp_dir();
    let book = init_repo_with_book(repo.path());
    assert!(WatchTarget::new(&book).unwrap().ensure_repository().is_ok());
}

// =============================================================================
// Commit
// =============================================================================

#[tokio::test]
async fn commit_stages_and_commits_only_the_file() {
    let dir = temp_dir();
    let book = init_repo_with_book(dir.path());
    fs::write(&book, "v2\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "scratch\n").unwrap();

    let ops = operations(&book);
    let result = ops.commit("  Revise chapter one  ", false, &token()).await;

    assert!(result.success(), "{result}");
    insta::assert_snapshot!(result.message(), @"Commit completed.");
    assert_eq!(git_stdout(&["log", "-1", "--format=%s"], dir.path()), "Revise chapter one");
    assert_eq!(
        git_stdout(&["show", "--name-only", "--format=", "HEAD"], dir.path()),
        "book.txt"
    );
    assert!(!ops.has_pending_changes(&token()).await.unwrap());
}

#[tokio::test]
async fn commit_without_changes_reports_nothing_to_commit() {
    let dir = temp_dir();
    let book = init_repo_with_book(dir.path());

    let result = operations(&book).commit("Nothing", false, &token()).await;

    assert!(!result.success());
    insta::assert_snapshot!(result.message(), @"There is nothing to commit.");
    assert_eq!(git_stdout(&["rev-list", "--count", "HEAD"], dir.path()), "1");
}

#[tokio::test]
async fn commit_and_push_without_remote_keeps_commit() {
    let dir = temp_dir();
    let book = init_repo_with_book(dir.path());
    fs::write(&book, "v2\n").unwrap();

    let result = operations(&book).commit("Edit", true, &token()).await;

    assert!(!result.success());
    assert!(
        result.message().starts_with("Commit succeeded, but push failed:"),
        "{result}"
    );
    assert_eq!(git_stdout(&["rev-list", "--count", "HEAD"], dir.path()), "2");
}

// =============================================================================
// Pull / push against a local bare remote
// =============================================================================

struct Remote {
    _root: TempDir,
    bare: std::path::PathBuf,
}

fn bare_remote() -> Remote {
    let root = temp_dir();
    let bare = root.path().join("remote.git");
    fs::create_dir(&bare).unwrap();
    assert!(run_git(&["init", "-q", "--bare", "-b", "main"], &bare));
    Remote { _root: root, bare }
}

fn clone(remote: &Remote, dir: &Path) -> std::path::PathBuf {
    let bare = remote.bare.to_string_lossy().into_owned();
    let dest = dir.join("work");
    assert!(run_git(
        &["clone", "-q", &bare, &dest.to_string_lossy()],
        dir
    ));
    run_git(&["config", "user.email", "test@test.com"], &dest);
    run_git(&["config", "user.name", "Test"], &dest);
    run_git(&["config", "commit.gpgsign", "false"], &dest);
    dest
}

/// Remote with one commit of `book.txt`, plus two clones of it.
fn remote_with_two_clones() -> (Remote, TempDir, std::path::PathBuf, TempDir, std::path::PathBuf) {
    let remote = bare_remote();

    let seed = temp_dir();
    init_repo_with_book(seed.path());
    let bare = remote.bare.to_string_lossy().into_owned();
    assert!(run_git(&["remote", "add", "origin", &bare], seed.path()));
    assert!(run_git(&["push", "-q", "-u", "origin", "main"], seed.path()));

    let a = temp_dir();
    let work_a = clone(&remote, a.path());
    let b = temp_dir();
    let work_b = clone(&remote, b.path());
    (remote, a, work_a, b, work_b)
}

#[tokio::test]
async fn push_then_pull_fast_forwards() {
    let (_remote, _a, work_a, _b, work_b) = remote_with_two_clones();

    let book_a = work_a.join("book.txt");
    fs::write(&book_a, "from a\n").unwrap();
    let result = operations(&book_a).commit("Edit in A", true, &token()).await;
    assert!(result.success(), "{result}");
    insta::assert_snapshot!(result.message(), @"Commit and push completed.");

    let book_b = work_b.join("book.txt");
    let pulled = operations(&book_b).pull(&token()).await;
    assert!(pulled.success(), "{pulled}");
    assert!(pulled.message().starts_with("Pull completed:"));
    assert_eq!(fs::read_to_string(&book_b).unwrap(), "from a\n");
}

#[tokio::test]
async fn pull_refused_while_file_is_dirty() {
    let (_remote, _a, work_a, _b, work_b) = remote_with_two_clones();

    let book_a = work_a.join("book.txt");
    fs::write(&book_a, "from a\n").unwrap();
    assert!(operations(&book_a).commit("Edit in A", true, &token()).await.success());

    let book_b = work_b.join("book.txt");
    fs::write(&book_b, "local edit\n").unwrap();
    let head_before = git_stdout(&["rev-parse", "HEAD"], &work_b);

    let pulled = operations(&book_b).pull(&token()).await;

    assert!(!pulled.success());
    insta::assert_snapshot!(pulled.message(), @"Pull blocked: local or staged changes exist in book.txt. Commit, stash or discard them first.");
    assert_eq!(git_stdout(&["rev-parse", "HEAD"], &work_b), head_before);
    assert_eq!(fs::read_to_string(&book_b).unwrap(), "local edit\n");
}

#[tokio::test]
async fn pull_refuses_diverged_history() {
    let (_remote, _a, work_a, _b, work_b) = remote_with_two_clones();

    let book_a = work_a.join("book.txt");
    fs::write(&book_a, "from a\n").unwrap();
    assert!(operations(&book_a).commit("Edit in A", true, &token()).await.success());

    let book_b = work_b.join("book.txt");
    fs::write(&book_b, "from b\n").unwrap();
    assert!(operations(&book_b).commit("Edit in B", false, &token()).await.success());

    let pulled = operations(&book_b).pull(&token()).await;
    assert!(!pulled.success());
    assert!(pulled.message().starts_with("Pull failed:"), "{pulled}");
}

#[tokio::test]
async fn push_reports_up_to_date() {
    let (_remote, _a, work_a, _b, _work_b) = remote_with_two_clones();

    let result = operations(&work_a.join("book.txt")).push(&token()).await;
    assert!(result.success(), "{result}");
    assert!(result.message().starts_with("Push completed:"));
}

// =============================================================================
// Watching
// =============================================================================

#[tokio::test]
async fn watch_session_reports_saved_change() {
    let dir = temp_dir();
    let book = init_repo_with_book(dir.path());

    let settings = MonitorSettings::builder()
        .with_debounce(Duration::from_millis(100))
        .with_lock_poll(Duration::from_millis(20))
        .build();
    let mut session = WatchSession::new(
        WatchTarget::new(&book).unwrap(),
        Arc::new(ShellRunner::new("git")) as Arc<dyn CommandRunner>,
        SuppressionGate::new(),
        settings,
    );
    session.start().unwrap();

    fs::write(&book, "v2\n").unwrap();

    let event = tokio::time::timeout(Duration::from_secs(15), session.next_event())
        .await
        .expect("event within timeout")
        .expect("monitor alive");
    assert_eq!(
        event,
        MonitorEvent::ChangesDetected {
            path: book.clone()
        }
    );
    session.stop();
}

#[tokio::test]
async fn watch_session_ignores_rewrite_with_same_content() {
    let dir = temp_dir();
    let book = init_repo_with_book(dir.path());

    let settings = MonitorSettings::builder()
        .with_debounce(Duration::from_millis(100))
        .with_lock_poll(Duration::from_millis(20))
        .build();
    let mut session = WatchSession::new(
        WatchTarget::new(&book).unwrap(),
        Arc::new(ShellRunner::new("git")) as Arc<dyn CommandRunner>,
        SuppressionGate::new(),
        settings,
    );
    session.start().unwrap();

    fs::write(&book, "v1\n").unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), session.next_event()).await;
    assert!(event.is_err(), "unexpected event {event:?}");
    session.stop();
}
