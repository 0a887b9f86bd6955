//! Rebase orchestration
//!
//! Replays a CR's head onto the tip of its base and force-updates the remote
//! head. Every failure collapses into [`RebaseOutcome::Failure`]: the caller
//! gives up on the CR, there is no partial recovery.
//!
//! Each CR gets its own working copy (`<workdir>/<owner>-<repo>/cr-<id>`), so
//! concurrent runs for different CRs never share a checkout.

mod git;
mod workspace;

pub use git::GitRebaser;
pub use workspace::workspace_path;

use crate::types::ChangeRequest;
use async_trait::async_trait;
use thiserror::Error;

/// Errors from git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Git command failed.
    #[error("git command failed: {command}\nstderr: {stderr}")]
    CommandFailed {
        /// The command line (credentials redacted)
        command: String,
        /// Captured stderr (credentials redacted)
        stderr: String,
    },

    /// Replaying commits hit a conflict.
    #[error("rebase conflict: {details}")]
    Conflict {
        /// Git's output
        details: String,
    },

    /// Remote rejected the force push.
    #[error("push rejected: {details}")]
    PushRejected {
        /// Git's output
        details: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

/// Outcome of a rebase attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebaseOutcome {
    /// Head replayed and pushed
    Success,
    /// Something failed; the detail is for logs only
    Failure(String),
}

impl RebaseOutcome {
    /// Returns true if the rebase succeeded.
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Rebases a CR's head branch onto its base branch
#[async_trait]
pub trait Rebaser: Send + Sync {
    /// Fetch, replay with autosquash, force-push
    async fn rebase(&self, cr: &ChangeRequest) -> RebaseOutcome;
}
