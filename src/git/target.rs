// gitsentry: Single-File Git Watcher
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The single watched file and the paths derived from it.
//!
//! ```text
//! /home/me/books/budget.xlsx
//!  \_____________/ \_________/
//!     repo_root     relative (pathspec)
//! ```
//!
//! Git is always invoked with the containing directory as working
//! directory, so the pathspec is just the file name.

use std::path::{Path, PathBuf};

use crate::error::{GitError, SentryResult};

/// Absolute path of the monitored file. Immutable for a watch session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    file: PathBuf,
    repo_root: PathBuf,
    relative: String,
}

impl WatchTarget {
    /// Validates `path` and derives the repository root and pathspec.
    ///
    /// The file does not need to exist yet.
    ///
    /// # Errors
    ///
    /// Returns `GitError::InvalidTarget` if the path is relative or has no
    /// file name or parent directory.
    pub fn new(path: impl AsRef<Path>) -> SentryResult<Self> {
        let file = path.as_ref();
        let invalid = |reason: &str| GitError::InvalidTarget {
            path: file.display().to_string(),
            reason: reason.to_string(),
        };

        if !file.is_absolute() {
            return Err(invalid("path must be absolute").into());
        }
        let name = file
            .file_name()
            .ok_or_else(|| invalid("path has no file name"))?;
        let parent = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| invalid("path has no parent directory"))?;

        Ok(Self {
            file: file.to_path_buf(),
            repo_root: parent.to_path_buf(),
            relative: name.to_string_lossy().into_owned(),
        })
    }

    /// Absolute path of the watched file.
    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Directory git commands run in.
    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// Path of the file relative to [`WatchTarget::repo_root`].
    #[must_use]
    pub fn relative(&self) -> &str {
        &self.relative
    }

    /// Checks that the containing directory is inside a git work tree.
    ///
    /// # Errors
    ///
    /// Returns `GitError::RepoNotFound` if no repository can be discovered.
    pub fn ensure_repository(&self) -> SentryResult<()> {
        match gix::discover(&self.repo_root) {
            Ok(repo) if repo.workdir().is_some() => Ok(()),
            _ => Err(GitError::RepoNotFound {
                path: self.repo_root.display().to_string(),
            }
            .into()),
        }
    }
}

impl std::fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file.display())
    }
}
