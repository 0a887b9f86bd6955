//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in current tests but are
//! available for future test development.

#![allow(dead_code)]

use async_trait::async_trait;
use mergebot::error::{Error, Result};
use mergebot::platform::PlatformService;
use mergebot::types::{
    ChangeRequest, CiState, LabelChange, MergeResult, MergeStrategy, PlatformConfig, Review,
    StatusCheck,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

/// Call record for `create_comment`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentCall {
    pub cr_id: u64,
    pub body: String,
}

/// Call record for `add_label` / `remove_label`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelCall {
    Add(u64, String),
    Remove(u64, String),
}

/// Call record for `merge`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCall {
    pub cr_id: u64,
    pub strategy: MergeStrategy,
}

/// In-memory platform for testing
///
/// This manually implements `PlatformService` rather than using mockall,
/// so label mutations can act on stored CRs.
///
/// Features:
/// - Stored CRs whose labels change on add/remove
/// - Call tracking for verification
/// - Configurable reviews, CI state, and merge responses
/// - Error injection for failure path testing
pub struct MockPlatformService {
    config: PlatformConfig,
    crs: Mutex<BTreeMap<u64, ChangeRequest>>,
    reviews: Mutex<HashMap<u64, Vec<Review>>>,
    statuses: Mutex<HashMap<String, CiState>>,
    merge_responses: Mutex<HashMap<u64, MergeResult>>,
    // Call tracking
    get_calls: Mutex<Vec<u64>>,
    list_by_base_calls: Mutex<Vec<String>>,
    comment_calls: Mutex<Vec<CommentCall>>,
    label_calls: Mutex<Vec<LabelCall>>,
    merge_calls: Mutex<Vec<MergeCall>>,
    // Error injection
    error_on_get: Mutex<Option<String>>,
    error_on_comment: Mutex<Option<String>>,
    error_on_merge: Mutex<Option<String>>,
    error_on_list_by_base: Mutex<Option<String>>,
}

impl MockPlatformService {
    /// Create a new mock with the given config
    pub fn with_config(config: PlatformConfig) -> Self {
        Self {
            config,
            crs: Mutex::new(BTreeMap::new()),
            reviews: Mutex::new(HashMap::new()),
            statuses: Mutex::new(HashMap::new()),
            merge_responses: Mutex::new(HashMap::new()),
            get_calls: Mutex::new(Vec::new()),
            list_by_base_calls: Mutex::new(Vec::new()),
            comment_calls: Mutex::new(Vec::new()),
            label_calls: Mutex::new(Vec::new()),
            merge_calls: Mutex::new(Vec::new()),
            error_on_get: Mutex::new(None),
            error_on_comment: Mutex::new(None),
            error_on_merge: Mutex::new(None),
            error_on_list_by_base: Mutex::new(None),
        }
    }

    // === Setup ===

    /// Store a CR
    pub fn add_cr(&self, cr: ChangeRequest) {
        self.crs.lock().unwrap().insert(cr.id, cr);
    }

    /// Set the reviews returned for a CR
    pub fn set_reviews(&self, cr_id: u64, reviews: Vec<Review>) {
        self.reviews.lock().unwrap().insert(cr_id, reviews);
    }

    /// Set the CI state for a commit (default: success)
    pub fn set_status(&self, sha: &str, state: CiState) {
        self.statuses.lock().unwrap().insert(sha.to_string(), state);
    }

    /// Set the response for `merge` (default: merged with a fake sha)
    pub fn set_merge_response(&self, cr_id: u64, result: MergeResult) {
        self.merge_responses.lock().unwrap().insert(cr_id, result);
    }

    // === Error injection methods ===

    /// Make `get_change_request` return an error
    pub fn fail_get(&self, msg: &str) {
        *self.error_on_get.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_comment` return an error
    pub fn fail_comment(&self, msg: &str) {
        *self.error_on_comment.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `merge` return an error
    pub fn fail_merge(&self, msg: &str) {
        *self.error_on_merge.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `list_open_by_base` return an error
    pub fn fail_list_by_base(&self, msg: &str) {
        *self.error_on_list_by_base.lock().unwrap() = Some(msg.to_string());
    }

    // === Inspection ===

    /// Current state of a stored CR
    pub fn cr(&self, cr_id: u64) -> ChangeRequest {
        self.crs.lock().unwrap()[&cr_id].clone()
    }

    pub fn get_calls(&self) -> Vec<u64> {
        self.get_calls.lock().unwrap().clone()
    }

    pub fn list_by_base_calls(&self) -> Vec<String> {
        self.list_by_base_calls.lock().unwrap().clone()
    }

    pub fn comment_calls(&self) -> Vec<CommentCall> {
        self.comment_calls.lock().unwrap().clone()
    }

    pub fn label_calls(&self) -> Vec<LabelCall> {
        self.label_calls.lock().unwrap().clone()
    }

    pub fn merge_calls(&self) -> Vec<MergeCall> {
        self.merge_calls.lock().unwrap().clone()
    }

    /// Assert a comment containing `needle` was posted on a CR
    pub fn assert_commented(&self, cr_id: u64, needle: &str) {
        let calls = self.comment_calls();
        assert!(
            calls
                .iter()
                .any(|c| c.cr_id == cr_id && c.body.contains(needle)),
            "expected a comment on #{cr_id} containing {needle:?}, got {calls:?}"
        );
    }

    /// Assert nothing was written to the platform
    pub fn assert_no_writes(&self) {
        assert!(self.comment_calls().is_empty(), "unexpected comments");
        assert!(self.label_calls().is_empty(), "unexpected label changes");
        assert!(self.merge_calls().is_empty(), "unexpected merges");
    }

    fn injected(slot: &Mutex<Option<String>>) -> Result<()> {
        match slot.lock().unwrap().as_ref() {
            Some(msg) => Err(Error::Platform(msg.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn get_change_request(&self, id: u64) -> Result<ChangeRequest> {
        self.get_calls.lock().unwrap().push(id);
        Self::injected(&self.error_on_get)?;
        self.crs
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(Error::CrNotFound(id))
    }

    async fn list_open_by_base(&self, base: &str) -> Result<Vec<ChangeRequest>> {
        self.list_by_base_calls
            .lock()
            .unwrap()
            .push(base.to_string());
        Self::injected(&self.error_on_list_by_base)?;
        Ok(self
            .crs
            .lock()
            .unwrap()
            .values()
            .filter(|cr| cr.is_open && cr.base_ref == base)
            .cloned()
            .collect())
    }

    async fn find_open_by_head(&self, head: &str) -> Result<Option<ChangeRequest>> {
        Ok(self
            .crs
            .lock()
            .unwrap()
            .values()
            .find(|cr| cr.is_open && cr.head_ref == head)
            .cloned())
    }

    async fn list_reviews(&self, id: u64) -> Result<Vec<Review>> {
        Ok(self
            .reviews
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn combined_status(&self, sha: &str) -> Result<StatusCheck> {
        let state = self
            .statuses
            .lock()
            .unwrap()
            .get(sha)
            .copied()
            .unwrap_or(CiState::Success);
        Ok(StatusCheck::new(state))
    }

    async fn add_label(&self, id: u64, label: &str) -> Result<LabelChange> {
        self.label_calls
            .lock()
            .unwrap()
            .push(LabelCall::Add(id, label.to_string()));
        let mut crs = self.crs.lock().unwrap();
        let cr = crs.get_mut(&id).ok_or(Error::CrNotFound(id))?;
        Ok(if cr.labels.insert(label.to_string()) {
            LabelChange::Applied
        } else {
            LabelChange::AlreadyInState
        })
    }

    async fn remove_label(&self, id: u64, label: &str) -> Result<LabelChange> {
        self.label_calls
            .lock()
            .unwrap()
            .push(LabelCall::Remove(id, label.to_string()));
        let mut crs = self.crs.lock().unwrap();
        let cr = crs.get_mut(&id).ok_or(Error::CrNotFound(id))?;
        Ok(if cr.labels.remove(label) {
            LabelChange::Applied
        } else {
            LabelChange::AlreadyInState
        })
    }

    async fn create_comment(&self, id: u64, body: &str) -> Result<()> {
        Self::injected(&self.error_on_comment)?;
        self.comment_calls.lock().unwrap().push(CommentCall {
            cr_id: id,
            body: body.to_string(),
        });
        Ok(())
    }

    async fn merge(&self, id: u64, strategy: MergeStrategy) -> Result<MergeResult> {
        self.merge_calls.lock().unwrap().push(MergeCall {
            cr_id: id,
            strategy,
        });
        Self::injected(&self.error_on_merge)?;
        let response = self.merge_responses.lock().unwrap().get(&id).cloned();
        Ok(response.unwrap_or_else(|| MergeResult {
            merged: true,
            sha: Some(format!("merged-{id}")),
            message: None,
        }))
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
