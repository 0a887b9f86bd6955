//! Core types for mergebot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Platform-computed classification of whether (and why) a change request
/// can merge cleanly against its base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeableState {
    /// Mergeable as-is
    Clean,
    /// Content conflicts with the base branch
    Dirty,
    /// Head is linearly behind its base
    Behind,
    /// Held back by required reviews or status checks
    Blocked,
    /// Not yet computed, or a state the bot does not act on
    Unknown,
}

impl MergeableState {
    /// Map GitHub's `mergeable_state` string
    ///
    /// `unstable` (non-required checks failing) and `has_hooks` still merge
    /// cleanly, so they count as clean. Anything unrecognized is unknown.
    pub fn from_github(state: &str) -> Self {
        match state {
            "clean" | "unstable" | "has_hooks" => Self::Clean,
            "dirty" => Self::Dirty,
            "behind" => Self::Behind,
            "blocked" => Self::Blocked,
            _ => Self::Unknown,
        }
    }

    /// Map GitLab's `detailed_merge_status` string
    pub fn from_gitlab(status: &str) -> Self {
        match status {
            "mergeable" => Self::Clean,
            "conflict" | "broken_status" => Self::Dirty,
            "need_rebase" => Self::Behind,
            "ci_must_pass" | "ci_still_running" | "not_approved" | "discussions_not_resolved"
            | "blocked_status" | "requested_changes" | "draft_status" => Self::Blocked,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for MergeableState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Dirty => write!(f, "dirty"),
            Self::Behind => write!(f, "behind"),
            Self::Blocked => write!(f, "blocked"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// A change request (pull request / merge request)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// PR/MR number, unique within the repository
    pub id: u64,
    /// Title; may embed bracketed issue references like `[PROJ-123]`
    pub title: String,
    /// Label names
    pub labels: BTreeSet<String>,
    /// Whether the CR is still open
    pub is_open: bool,
    /// Platform merge-readiness classification
    pub mergeable_state: MergeableState,
    /// Authoritative merge flag checked right before merging
    /// - `Some(true)` = mergeable
    /// - `Some(false)` = not mergeable
    /// - `None` = unknown (platform still computing)
    pub is_mergeable: Option<bool>,
    /// Base branch name
    pub base_ref: String,
    /// Head branch name
    pub head_ref: String,
    /// Head commit SHA (for status lookups)
    pub head_sha: String,
    /// Web URL for the CR
    pub html_url: String,
}

impl ChangeRequest {
    /// Check whether the CR carries a label
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }
}

/// Review verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewState {
    /// Reviewer approved
    Approved,
    /// Reviewer requested changes
    ChangesRequested,
    /// Comment-only review
    Commented,
    /// Review started but not submitted
    Pending,
    /// Review was dismissed
    Dismissed,
}

/// A review on a change request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Reviewer login
    pub author: String,
    /// Verdict
    pub state: ReviewState,
    /// Submission time, when the platform reports one
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Review {
    /// Build a review without a timestamp
    pub fn new(author: impl Into<String>, state: ReviewState) -> Self {
        Self {
            author: author.into(),
            state,
            submitted_at: None,
        }
    }
}

/// Aggregated CI state for a head commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CiState {
    /// All checks passed (or none configured)
    Success,
    /// At least one check failed
    Failure,
    /// At least one check has not finished
    Pending,
}

impl std::fmt::Display for CiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// Aggregated status check result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCheck {
    /// Combined state
    pub state: CiState,
}

impl StatusCheck {
    /// Shorthand constructor
    pub const fn new(state: CiState) -> Self {
        Self { state }
    }
}

/// Merge strategy/method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Rebase commits onto base branch
    #[default]
    Rebase,
    /// Create a merge commit
    Merge,
    /// Squash all commits into one
    Squash,
}

impl std::fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rebase => write!(f, "rebase"),
            Self::Merge => write!(f, "merge"),
            Self::Squash => write!(f, "squash"),
        }
    }
}

impl std::str::FromStr for MergeStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rebase" => Ok(Self::Rebase),
            "merge" => Ok(Self::Merge),
            "squash" => Ok(Self::Squash),
            other => Err(format!("unknown merge strategy '{other}'")),
        }
    }
}

/// Result of a merge operation
#[derive(Debug, Clone)]
pub struct MergeResult {
    /// Whether the merge was successful
    pub merged: bool,
    /// The SHA of the merge commit (if successful)
    pub sha: Option<String>,
    /// Message from the merge operation (especially on failure)
    pub message: Option<String>,
}

/// Outcome of an idempotent label mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelChange {
    /// The label was added or removed
    Applied,
    /// The label was already in the requested state
    AlreadyInState,
}

/// Detected platform type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// GitHub or GitHub Enterprise
    #[default]
    GitHub,
    /// GitLab or self-hosted GitLab
    GitLab,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GitHub => write!(f, "GitHub"),
            Self::GitLab => write!(f, "GitLab"),
        }
    }
}

/// Platform configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Platform type
    pub platform: Platform,
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Custom host (None for github.com/gitlab.com)
    pub host: Option<String>,
}

impl PlatformConfig {
    /// Host serving git over HTTPS
    pub fn git_host(&self) -> &str {
        self.host.as_deref().unwrap_or(match self.platform {
            Platform::GitHub => "github.com",
            Platform::GitLab => "gitlab.com",
        })
    }

    /// `owner/repo`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}
