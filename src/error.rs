//! Error types for mergebot

use thiserror::Error;

/// Errors surfaced by mergebot
///
/// Domain outcomes such as conflicts, failed CI, or a failed rebase are not
/// errors: they become a `GiveUp` action with a human-readable reason. This
/// enum covers the failures that stop a run outright.
#[derive(Debug, Error)]
pub enum Error {
    /// GitHub API error with context
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// GitLab API error with context
    #[error("GitLab API error: {0}")]
    GitLabApi(String),

    /// Generic platform error (used by test doubles and shared helpers)
    #[error("platform error: {0}")]
    Platform(String),

    /// Git subprocess error outside the rebase procedure
    #[error("git error: {0}")]
    Git(String),

    /// Issue tracker error
    #[error("issue tracker error: {0}")]
    IssueTracker(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication error
    #[error("authentication error: {0}")]
    Auth(String),

    /// Inbound event could not be parsed
    #[error("event error: {0}")]
    Event(String),

    /// Change request does not exist on the platform
    #[error("change request #{0} not found")]
    CrNotFound(u64),

    /// Internal invariant violated
    #[error("internal error: {0}")]
    Internal(String),

    /// Octocrab error
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),

    /// HTTP error
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
