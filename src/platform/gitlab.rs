//! GitLab platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    ChangeRequest, CiState, LabelChange, MergeResult, MergeStrategy, MergeableState, Platform,
    PlatformConfig, Review, ReviewState, StatusCheck,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// GitLab service using reqwest
pub struct GitLabService {
    client: Client,
    token: String,
    base_url: String,
    config: PlatformConfig,
    project_path: String,
}

/// MR as returned by the single and list endpoints
#[derive(Deserialize)]
struct MergeRequest {
    iid: u64,
    title: String,
    #[serde(default)]
    labels: Vec<String>,
    state: String, // "opened", "closed", "merged", "locked"
    #[serde(default)]
    detailed_merge_status: Option<String>,
    web_url: String,
    source_branch: String,
    target_branch: String,
    #[serde(default)]
    sha: Option<String>,
}

impl From<MergeRequest> for ChangeRequest {
    fn from(mr: MergeRequest) -> Self {
        let status = mr.detailed_merge_status.as_deref().unwrap_or("unchecked");
        let mergeable_state = MergeableState::from_gitlab(status);
        // GitLab computes merge status asynchronously
        let is_mergeable = match status {
            "unchecked" | "checking" | "preparing" => None,
            "mergeable" => Some(true),
            _ => Some(false),
        };

        Self {
            id: mr.iid,
            title: mr.title,
            labels: mr.labels.into_iter().collect(),
            is_open: mr.state == "opened",
            mergeable_state,
            is_mergeable,
            base_ref: mr.target_branch,
            head_ref: mr.source_branch,
            head_sha: mr.sha.unwrap_or_default(),
            html_url: mr.web_url,
        }
    }
}

/// MR approvals response
#[derive(Deserialize)]
struct MrApprovals {
    #[serde(default)]
    approved_by: Vec<ApprovedBy>,
}

#[derive(Deserialize)]
struct ApprovedBy {
    user: GitLabUser,
}

#[derive(Deserialize)]
struct GitLabUser {
    username: String,
}

/// Reviewer entry from the reviewers endpoint
#[derive(Deserialize)]
struct MrReviewer {
    user: GitLabUser,
    state: String, // "unreviewed", "reviewed", "requested_changes", "approved", ...
}

/// Commit status entry
#[derive(Deserialize)]
struct CommitStatus {
    status: String, // "success", "failed", "running", "pending", "canceled", ...
}

/// Merge response
#[derive(Deserialize)]
struct MergeResponse {
    state: String,
    merge_commit_sha: Option<String>,
}

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

impl GitLabService {
    /// Create a new GitLab service
    pub fn new(token: String, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let base_url = format!("https://{}", host.as_deref().unwrap_or("gitlab.com"));
        let mut service = Self::with_base_url(token, owner, repo, base_url)?;
        service.config.host = host.filter(|h| h != "gitlab.com");
        Ok(service)
    }

    /// Create a GitLab service against an explicit base URL (scheme included)
    pub fn with_base_url(
        token: String,
        owner: String,
        repo: String,
        base_url: String,
    ) -> Result<Self> {
        let project_path = format!("{owner}/{repo}");

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::GitLabApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
            config: PlatformConfig {
                platform: Platform::GitLab,
                owner,
                repo,
                host: None,
            },
            project_path,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v4{}", self.base_url, path)
    }

    fn encoded_project(&self) -> String {
        urlencoding::encode(&self.project_path).into_owned()
    }

    fn mr_url(&self, iid: u64, suffix: &str) -> String {
        self.api_url(&format!(
            "/projects/{}/merge_requests/{iid}{suffix}",
            self.encoded_project()
        ))
    }

    async fn list_mrs(&self, query: &[(&str, &str)]) -> Result<Vec<ChangeRequest>> {
        let url = self.api_url(&format!(
            "/projects/{}/merge_requests",
            self.encoded_project()
        ));

        let mrs: Vec<MergeRequest> = self
            .client
            .get(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .query(query)
            .query(&[("state", "opened"), ("per_page", "100")])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        Ok(mrs.into_iter().map(Into::into).collect())
    }

    async fn update_labels(&self, iid: u64, field: &str, label: &str) -> Result<()> {
        let mut body = serde_json::Map::new();
        body.insert(field.to_string(), serde_json::Value::from(label));

        self.client
            .put(self.mr_url(iid, ""))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?;
        Ok(())
    }
}

fn aggregate_statuses(statuses: &[CommitStatus]) -> CiState {
    let mut state = CiState::Success;
    for status in statuses {
        match status.status.as_str() {
            "success" | "skipped" | "manual" => {}
            "failed" | "canceled" => return CiState::Failure,
            _ => state = CiState::Pending,
        }
    }
    state
}

#[async_trait]
impl PlatformService for GitLabService {
    async fn get_change_request(&self, id: u64) -> Result<ChangeRequest> {
        debug!(mr_iid = id, "getting MR");

        let response = self
            .client
            .get(self.mr_url(id, ""))
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::CrNotFound(id));
        }

        let mr: MergeRequest = response
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        let cr: ChangeRequest = mr.into();
        debug!(mr_iid = id, mergeable_state = %cr.mergeable_state, "got MR");
        Ok(cr)
    }

    async fn list_open_by_base(&self, base: &str) -> Result<Vec<ChangeRequest>> {
        debug!(base, "listing open MRs by target branch");
        let result = self.list_mrs(&[("target_branch", base)]).await?;
        debug!(base, count = result.len(), "listed open MRs");
        Ok(result)
    }

    async fn find_open_by_head(&self, head: &str) -> Result<Option<ChangeRequest>> {
        debug!(head, "finding open MR by source branch");
        Ok(self
            .list_mrs(&[("source_branch", head)])
            .await?
            .into_iter()
            .next())
    }

    async fn list_reviews(&self, id: u64) -> Result<Vec<Review>> {
        debug!(mr_iid = id, "listing approvals");

        let approvals: MrApprovals = self
            .client
            .get(self.mr_url(id, "/approvals"))
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        let mut reviews: Vec<Review> = approvals
            .approved_by
            .into_iter()
            .map(|a| Review::new(a.user.username, ReviewState::Approved))
            .collect();

        // Older GitLab versions lack the reviewers endpoint; treat as no verdicts
        match self
            .client
            .get(self.mr_url(id, "/reviewers"))
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                let reviewers: Vec<MrReviewer> = response.json().await.map_err(|e| {
                    Error::GitLabApi(format!("failed to parse reviewers of !{id}: {e}"))
                })?;
                reviews.extend(
                    reviewers
                        .into_iter()
                        .filter(|r| r.state == "requested_changes")
                        .map(|r| Review::new(r.user.username, ReviewState::ChangesRequested)),
                );
            }
            Ok(response) => {
                debug!(status = %response.status(), "reviewers endpoint unavailable");
            }
            Err(e) => debug!(error = %e, "reviewers endpoint unavailable"),
        }

        debug!(mr_iid = id, count = reviews.len(), "listed reviews");
        Ok(reviews)
    }

    async fn combined_status(&self, sha: &str) -> Result<StatusCheck> {
        debug!(sha, "checking commit statuses");
        let url = self.api_url(&format!(
            "/projects/{}/repository/commits/{sha}/statuses",
            self.encoded_project()
        ));

        let statuses: Vec<CommitStatus> = self
            .client
            .get(&url)
            .header("PRIVATE-TOKEN", &self.token)
            .query(&[("all", "false"), ("per_page", "100")])
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;

        let state = aggregate_statuses(&statuses);
        debug!(sha, count = statuses.len(), %state, "commit statuses");
        Ok(StatusCheck::new(state))
    }

    async fn add_label(&self, id: u64, label: &str) -> Result<LabelChange> {
        if self.get_change_request(id).await?.has_label(label) {
            debug!(mr_iid = id, label, "label already present");
            return Ok(LabelChange::AlreadyInState);
        }
        debug!(mr_iid = id, label, "adding label");
        self.update_labels(id, "add_labels", label).await?;
        Ok(LabelChange::Applied)
    }

    async fn remove_label(&self, id: u64, label: &str) -> Result<LabelChange> {
        if !self.get_change_request(id).await?.has_label(label) {
            debug!(mr_iid = id, label, "label already absent");
            return Ok(LabelChange::AlreadyInState);
        }
        debug!(mr_iid = id, label, "removing label");
        self.update_labels(id, "remove_labels", label).await?;
        Ok(LabelChange::Applied)
    }

    async fn create_comment(&self, id: u64, body: &str) -> Result<()> {
        debug!(mr_iid = id, "creating MR comment");
        self.client
            .post(self.mr_url(id, "/notes"))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?;

        debug!(mr_iid = id, "created MR comment");
        Ok(())
    }

    async fn merge(&self, id: u64, strategy: MergeStrategy) -> Result<MergeResult> {
        debug!(mr_iid = id, %strategy, "merging MR");

        // GitLab applies the project's merge method; only squash is per-request
        let body = match strategy {
            MergeStrategy::Squash => serde_json::json!({ "squash": true }),
            MergeStrategy::Merge | MergeStrategy::Rebase => serde_json::json!({}),
        };

        let response: MergeResponse = self
            .client
            .put(self.mr_url(id, "/merge"))
            .header("PRIVATE-TOKEN", &self.token)
            .json(&body)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(format!("Merge failed: {e}")))?
            .json()
            .await?;

        let merge_result = MergeResult {
            merged: response.state == "merged",
            sha: response.merge_commit_sha,
            message: None,
        };

        debug!(
            mr_iid = id,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(s: &str) -> CommitStatus {
        CommitStatus {
            status: s.to_string(),
        }
    }

    #[test]
    fn test_no_statuses_is_success() {
        assert_eq!(aggregate_statuses(&[]), CiState::Success);
    }

    #[test]
    fn test_running_is_pending() {
        assert_eq!(
            aggregate_statuses(&[status("success"), status("running")]),
            CiState::Pending
        );
    }

    #[test]
    fn test_failed_wins() {
        assert_eq!(
            aggregate_statuses(&[status("running"), status("failed")]),
            CiState::Failure
        );
    }

    #[test]
    fn test_mr_conversion_maps_status() {
        let mr = MergeRequest {
            iid: 7,
            title: "Add thing [PROJ-1]".to_string(),
            labels: vec!["merge-it".to_string()],
            state: "opened".to_string(),
            detailed_merge_status: Some("need_rebase".to_string()),
            web_url: "https://gitlab.com/g/p/-/merge_requests/7".to_string(),
            source_branch: "feat".to_string(),
            target_branch: "main".to_string(),
            sha: Some("abc".to_string()),
        };
        let cr: ChangeRequest = mr.into();
        assert_eq!(cr.mergeable_state, MergeableState::Behind);
        assert_eq!(cr.is_mergeable, Some(false));
        assert!(cr.is_open);
        assert!(cr.has_label("merge-it"));
    }
}
