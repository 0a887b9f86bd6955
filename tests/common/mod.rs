//! Shared test utilities

#![allow(dead_code)]

mod mock_collaborators;
mod mock_platform;
mod temp_repo;

pub use mock_collaborators::{MockCelebration, MockIssueTracker, MockRebaser};
pub use mock_platform::{CommentCall, LabelCall, MergeCall, MockPlatformService};
pub use temp_repo::{TempGitRemote, git_succeeds};

use mergebot::config::Policy;
use mergebot::engine::Collaborators;
use mergebot::types::{ChangeRequest, MergeableState, Platform, PlatformConfig};
use std::collections::BTreeSet;

/// GitHub config for `test/repo`
pub fn github_config() -> PlatformConfig {
    PlatformConfig {
        platform: Platform::GitHub,
        owner: "test".to_string(),
        repo: "repo".to_string(),
        host: None,
    }
}

/// Default policy (trigger `merge-it`, close `merge-it-and-close`)
pub fn policy() -> Policy {
    Policy::default()
}

/// An open, enrolled, mergeable CR against `main`
pub fn make_cr(id: u64, state: MergeableState) -> ChangeRequest {
    ChangeRequest {
        id,
        title: format!("Change {id}"),
        labels: BTreeSet::from(["merge-it".to_string()]),
        is_open: true,
        mergeable_state: state,
        is_mergeable: Some(true),
        base_ref: "main".to_string(),
        head_ref: format!("feature-{id}"),
        head_sha: format!("sha-{id}"),
        html_url: format!("https://github.com/test/repo/pull/{id}"),
    }
}

/// Replace a CR's labels
pub fn with_labels(mut cr: ChangeRequest, labels: &[&str]) -> ChangeRequest {
    cr.labels = labels.iter().map(|l| (*l).to_string()).collect();
    cr
}

/// Test doubles bundled for the executor
pub struct Doubles {
    pub platform: MockPlatformService,
    pub rebaser: MockRebaser,
    pub tracker: MockIssueTracker,
    pub celebration: MockCelebration,
}

impl Doubles {
    pub fn new() -> Self {
        Self {
            platform: MockPlatformService::with_config(github_config()),
            rebaser: MockRebaser::new(),
            tracker: MockIssueTracker::new(),
            celebration: MockCelebration::returning("https://images.dog.ceo/breeds/pug/1.jpg"),
        }
    }

    /// All collaborators, tracker included
    pub fn collab(&self) -> Collaborators<'_> {
        Collaborators {
            platform: &self.platform,
            rebaser: &self.rebaser,
            tracker: Some(&self.tracker),
            celebration: Some(&self.celebration),
        }
    }

    /// Collaborators without an issue tracker
    pub fn collab_without_tracker(&self) -> Collaborators<'_> {
        Collaborators {
            tracker: None,
            ..self.collab()
        }
    }
}
