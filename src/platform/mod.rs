//! Platform services for GitHub and GitLab
//!
//! Provides a unified interface for the CR reads and writes the bot needs.

mod factory;
mod github;
mod gitlab;

pub use factory::create_platform_service;
pub use github::GitHubService;
pub use gitlab::GitLabService;

use crate::error::Result;
use crate::types::{
    ChangeRequest, LabelChange, MergeResult, MergeStrategy, PlatformConfig, Review, StatusCheck,
};
use async_trait::async_trait;

/// Platform service trait for CR operations
///
/// This trait abstracts GitHub and GitLab operations, allowing the same
/// decision engine to work with either platform. Label mutations are
/// idempotent: asking for the state a CR is already in reports
/// [`LabelChange::AlreadyInState`] rather than an error.
#[async_trait]
pub trait PlatformService: Send + Sync {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch a CR by number
    async fn get_change_request(&self, id: u64) -> Result<ChangeRequest>;

    /// List open CRs targeting a base branch, with merge state populated
    async fn list_open_by_base(&self, base: &str) -> Result<Vec<ChangeRequest>>;

    /// Find the open CR whose head is the given branch
    async fn find_open_by_head(&self, head: &str) -> Result<Option<ChangeRequest>>;

    /// List all reviews on a CR, oldest first
    async fn list_reviews(&self, id: u64) -> Result<Vec<Review>>;

    /// Aggregated CI status for a commit
    async fn combined_status(&self, sha: &str) -> Result<StatusCheck>;

    // =========================================================================
    // Writes
    // =========================================================================

    /// Add a label
    async fn add_label(&self, id: u64, label: &str) -> Result<LabelChange>;

    /// Remove a label
    async fn remove_label(&self, id: u64, label: &str) -> Result<LabelChange>;

    /// Create a comment on a CR
    async fn create_comment(&self, id: u64, body: &str) -> Result<()>;

    /// Merge a CR with the given strategy
    async fn merge(&self, id: u64, strategy: MergeStrategy) -> Result<MergeResult>;

    /// Get the platform configuration
    fn config(&self) -> &PlatformConfig;
}
