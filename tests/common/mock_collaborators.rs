//! Mock rebaser, issue tracker, and celebration source

#![allow(dead_code)]

use async_trait::async_trait;
use mergebot::celebrate::Celebration;
use mergebot::error::{Error, Result};
use mergebot::rebase::{RebaseOutcome, Rebaser};
use mergebot::tracker::IssueTracker;
use mergebot::types::ChangeRequest;
use std::collections::HashSet;
use std::sync::Mutex;

/// Rebaser that records calls and succeeds unless told otherwise
#[derive(Default)]
pub struct MockRebaser {
    calls: Mutex<Vec<u64>>,
    failing: Mutex<HashSet<u64>>,
}

impl MockRebaser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make rebasing this CR fail
    pub fn fail_for(&self, cr_id: u64) {
        self.failing.lock().unwrap().insert(cr_id);
    }

    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Rebaser for MockRebaser {
    async fn rebase(&self, cr: &ChangeRequest) -> RebaseOutcome {
        self.calls.lock().unwrap().push(cr.id);
        if self.failing.lock().unwrap().contains(&cr.id) {
            RebaseOutcome::Failure("rebase conflict: CONFLICT (content)".to_string())
        } else {
            RebaseOutcome::Success
        }
    }
}

/// Issue tracker that records transitions
#[derive(Default)]
pub struct MockIssueTracker {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl MockIssueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make transitioning this key fail
    pub fn fail_for(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssueTracker for MockIssueTracker {
    async fn transition_to_done(&self, issue_key: &str) -> Result<()> {
        self.calls.lock().unwrap().push(issue_key.to_string());
        if self.failing.lock().unwrap().contains(issue_key) {
            return Err(Error::IssueTracker(format!("{issue_key}: no such issue")));
        }
        Ok(())
    }
}

/// Celebration source with a fixed answer
pub struct MockCelebration {
    url: Option<String>,
}

impl MockCelebration {
    pub fn returning(url: &str) -> Self {
        Self {
            url: Some(url.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { url: None }
    }
}

#[async_trait]
impl Celebration for MockCelebration {
    async fn image_url(&self) -> Result<String> {
        self.url
            .clone()
            .ok_or_else(|| Error::Internal("dog.ceo unavailable".to_string()))
    }
}
