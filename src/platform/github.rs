//! GitHub platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    ChangeRequest, CiState, LabelChange, MergeResult, MergeStrategy, MergeableState, Platform,
    PlatformConfig, Review, ReviewState, StatusCheck,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

const CHECK_RUNS_PER_PAGE: usize = 100;

/// GitHub service using octocrab
pub struct GitHubService {
    client: Octocrab,
    config: PlatformConfig,
    /// Token for raw HTTP requests (CI status checking)
    token: String,
    /// HTTP client for raw requests (CI status checking)
    http_client: Client,
    /// API base URL for raw requests, without trailing slash
    api_base: String,
    /// Actions run executing this bot; its check runs are not CI verdicts
    own_run_id: Option<u64>,
}

impl GitHubService {
    /// Create a new GitHub service
    pub fn new(token: &str, owner: String, repo: String, host: Option<String>) -> Result<Self> {
        let api_base = host.as_ref().map_or_else(
            || "https://api.github.com".to_string(),
            |h| format!("https://{h}/api/v3"),
        );
        Self::build(token, owner, repo, host, api_base)
    }

    /// Create a service against an explicit API base URL
    pub fn with_api_base(token: &str, owner: String, repo: String, api_base: &str) -> Result<Self> {
        Self::build(
            token,
            owner,
            repo,
            None,
            api_base.trim_end_matches('/').to_string(),
        )
    }

    /// Ignore check runs that belong to the given Actions workflow run
    #[must_use]
    pub fn excluding_run(mut self, run_id: Option<u64>) -> Self {
        self.own_run_id = run_id;
        self
    }

    fn build(
        token: &str,
        owner: String,
        repo: String,
        host: Option<String>,
        api_base: String,
    ) -> Result<Self> {
        let client = Octocrab::builder()
            .personal_token(token.to_string())
            .base_uri(api_base.as_str())
            .map_err(|e| Error::GitHubApi(e.to_string()))?
            .build()
            .map_err(|e| Error::GitHubApi(e.to_string()))?;

        let http_client = Client::builder()
            .user_agent("mergebot")
            .build()
            .map_err(|e| Error::GitHubApi(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            config: PlatformConfig {
                platform: Platform::GitHub,
                owner,
                repo,
                host,
            },
            token: token.to_string(),
            http_client,
            api_base,
            own_run_id: None,
        })
    }

    /// Check CI status by querying both commit statuses and check runs
    ///
    /// GitHub has two CI systems:
    /// 1. Commit Status API (legacy) - used by external CI services
    /// 2. Check Runs API (modern) - used by GitHub Actions
    async fn check_ci_status(&self, sha: &str) -> Result<CiState> {
        let statuses = self.check_commit_statuses(sha).await?;
        let check_runs = self.check_check_runs(sha).await?;
        Ok(combine_ci_states(statuses, check_runs))
    }

    async fn get_raw(&self, url: &str, what: &str) -> Result<Option<reqwest::Response>> {
        let response = self
            .http_client
            .get(url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to fetch {what}: {e}")))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(what, "endpoint returned 404, assuming none configured");
                Ok(None)
            }
            status if status.is_success() => Ok(Some(response)),
            status => Err(Error::GitHubApi(format!("Failed to fetch {what}: HTTP {status}"))),
        }
    }

    /// Check legacy commit statuses via combined status API
    async fn check_commit_statuses(&self, sha: &str) -> Result<CiState> {
        #[derive(Deserialize)]
        struct CombinedStatus {
            state: String,
            total_count: u32,
        }

        let url = format!(
            "{}/repos/{}/{}/commits/{}/status",
            self.api_base, self.config.owner, self.config.repo, sha
        );
        let Some(response) = self.get_raw(&url, "commit status").await? else {
            return Ok(CiState::Success);
        };

        let status: CombinedStatus = response
            .json()
            .await
            .map_err(|e| Error::GitHubApi(format!("Failed to parse commit status: {e}")))?;

        if status.total_count == 0 {
            debug!("No commit statuses configured");
            return Ok(CiState::Success);
        }

        debug!(state = %status.state, count = status.total_count, "Commit status result");
        Ok(match status.state.as_str() {
            "success" => CiState::Success,
            "pending" => CiState::Pending,
            _ => CiState::Failure,
        })
    }

    /// Check GitHub Actions check runs, following pagination
    async fn check_check_runs(&self, sha: &str) -> Result<CiState> {
        #[derive(Deserialize)]
        struct CheckRunsResponse {
            total_count: usize,
            check_runs: Vec<CheckRun>,
        }

        let mut runs = Vec::new();
        for page in 1.. {
            let url = format!(
                "{}/repos/{}/{}/commits/{}/check-runs?per_page={CHECK_RUNS_PER_PAGE}&page={page}",
                self.api_base, self.config.owner, self.config.repo, sha
            );
            let Some(response) = self.get_raw(&url, "check runs").await? else {
                return Ok(CiState::Success);
            };
            let body: CheckRunsResponse = response
                .json()
                .await
                .map_err(|e| Error::GitHubApi(format!("Failed to parse check runs: {e}")))?;

            let fetched = body.check_runs.len();
            runs.extend(body.check_runs);
            if fetched < CHECK_RUNS_PER_PAGE || runs.len() >= body.total_count {
                break;
            }
        }

        let before = runs.len();
        if let Some(run_id) = self.own_run_id {
            runs.retain(|run| !run.belongs_to_run(run_id));
        }
        if runs.is_empty() {
            debug!(skipped = before, "No check runs configured");
            return Ok(CiState::Success);
        }

        let state = classify_check_runs(&runs);
        debug!(count = runs.len(), skipped = before - runs.len(), %state, "Check runs result");
        Ok(state)
    }

    async fn fetch_pull(&self, id: u64) -> Result<octocrab::models::pulls::PullRequest> {
        self.client
            .pulls(&self.config.owner, &self.config.repo)
            .get(id)
            .await
            .map_err(|e| {
                if is_not_found(&e) {
                    Error::CrNotFound(id)
                } else {
                    e.into()
                }
            })
    }
}

/// A single check run from the check-runs API
#[derive(Debug, Deserialize)]
struct CheckRun {
    status: String,
    conclusion: Option<String>,
    #[serde(default)]
    details_url: Option<String>,
}

impl CheckRun {
    /// Actions jobs link to `.../actions/runs/{run_id}/job/{job_id}`
    fn belongs_to_run(&self, run_id: u64) -> bool {
        let marker = format!("/actions/runs/{run_id}/");
        self.details_url
            .as_deref()
            .is_some_and(|url| url.contains(&marker))
    }
}

/// Failure wins over pending; all completed-and-passing is success
fn classify_check_runs(runs: &[CheckRun]) -> CiState {
    let mut state = CiState::Success;
    for run in runs {
        if run.status != "completed" {
            state = CiState::Pending;
            continue;
        }
        match run.conclusion.as_deref() {
            Some("success" | "neutral" | "skipped") => {}
            // Completed without a passing conclusion (or none at all) is a failure
            _ => return CiState::Failure,
        }
    }
    state
}

const fn combine_ci_states(a: CiState, b: CiState) -> CiState {
    match (a, b) {
        (CiState::Failure, _) | (_, CiState::Failure) => CiState::Failure,
        (CiState::Pending, _) | (_, CiState::Pending) => CiState::Pending,
        _ => CiState::Success,
    }
}

fn is_not_found(err: &octocrab::Error) -> bool {
    matches!(err, octocrab::Error::GitHub { source, .. } if source.status_code.as_u16() == 404)
}

/// Helper to convert octocrab PR to our `ChangeRequest` type
fn cr_from_octocrab(pr: &octocrab::models::pulls::PullRequest) -> ChangeRequest {
    // Round-trip through serde to get GitHub's wire name for the state
    let mergeable_state = pr
        .mergeable_state
        .as_ref()
        .and_then(|s| serde_json::to_value(s).ok())
        .and_then(|v| v.as_str().map(MergeableState::from_github))
        .unwrap_or(MergeableState::Unknown);

    ChangeRequest {
        id: pr.number,
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        labels: pr
            .labels
            .as_ref()
            .map(|labels| labels.iter().map(|l| l.name.clone()).collect())
            .unwrap_or_default(),
        is_open: matches!(pr.state, Some(octocrab::models::IssueState::Open))
            && pr.closed_at.is_none(),
        mergeable_state,
        is_mergeable: pr.mergeable,
        base_ref: pr.base.ref_field.clone(),
        head_ref: pr.head.ref_field.clone(),
        head_sha: pr.head.sha.clone(),
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
    }
}

fn review_state_from_octocrab(state: Option<&octocrab::models::pulls::ReviewState>) -> ReviewState {
    use octocrab::models::pulls::ReviewState as Gh;
    match state {
        Some(Gh::Approved) => ReviewState::Approved,
        Some(Gh::ChangesRequested) => ReviewState::ChangesRequested,
        Some(Gh::Pending) => ReviewState::Pending,
        Some(Gh::Dismissed) => ReviewState::Dismissed,
        // ReviewState is non-exhaustive; anything else carries no verdict
        _ => ReviewState::Commented,
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn get_change_request(&self, id: u64) -> Result<ChangeRequest> {
        debug!(pr_number = id, "getting PR");
        let pr = self.fetch_pull(id).await?;
        let cr = cr_from_octocrab(&pr);
        debug!(
            pr_number = id,
            mergeable_state = %cr.mergeable_state,
            mergeable = ?cr.is_mergeable,
            "got PR"
        );
        Ok(cr)
    }

    async fn list_open_by_base(&self, base: &str) -> Result<Vec<ChangeRequest>> {
        debug!(base, "listing open PRs by base");
        let page = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .base(base)
            .state(octocrab::params::State::Open)
            .per_page(100)
            .send()
            .await?;
        let prs = self.client.all_pages(page).await?;

        // The list endpoint omits mergeable_state; fetch each PR individually
        let mut result = Vec::with_capacity(prs.len());
        for pr in prs {
            result.push(self.get_change_request(pr.number).await?);
        }
        debug!(base, count = result.len(), "listed open PRs");
        Ok(result)
    }

    async fn find_open_by_head(&self, head: &str) -> Result<Option<ChangeRequest>> {
        debug!(head, "finding open PR by head");
        let qualified = format!("{}:{}", &self.config.owner, head);

        let prs = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .head(qualified)
            .state(octocrab::params::State::Open)
            .send()
            .await?;

        match prs.items.first() {
            Some(pr) => Ok(Some(self.get_change_request(pr.number).await?)),
            None => {
                debug!(head, "no open PR for head");
                Ok(None)
            }
        }
    }

    async fn list_reviews(&self, id: u64) -> Result<Vec<Review>> {
        debug!(pr_number = id, "listing reviews");
        let page = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .list_reviews(id)
            .per_page(100)
            .send()
            .await?;
        let reviews = self.client.all_pages(page).await?;

        let result: Vec<Review> = reviews
            .iter()
            .map(|r| Review {
                author: r.user.as_ref().map(|u| u.login.clone()).unwrap_or_default(),
                state: review_state_from_octocrab(r.state.as_ref()),
                submitted_at: r.submitted_at,
            })
            .collect();
        debug!(pr_number = id, count = result.len(), "listed reviews");
        Ok(result)
    }

    async fn combined_status(&self, sha: &str) -> Result<StatusCheck> {
        debug!(sha, "checking combined status");
        let state = self.check_ci_status(sha).await?;
        debug!(sha, %state, "combined status");
        Ok(StatusCheck::new(state))
    }

    async fn add_label(&self, id: u64, label: &str) -> Result<LabelChange> {
        let pr = self.fetch_pull(id).await?;
        if cr_from_octocrab(&pr).has_label(label) {
            debug!(pr_number = id, label, "label already present");
            return Ok(LabelChange::AlreadyInState);
        }

        debug!(pr_number = id, label, "adding label");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .add_labels(id, &[label.to_string()])
            .await?;
        Ok(LabelChange::Applied)
    }

    async fn remove_label(&self, id: u64, label: &str) -> Result<LabelChange> {
        debug!(pr_number = id, label, "removing label");
        match self
            .client
            .issues(&self.config.owner, &self.config.repo)
            .remove_label(id, label)
            .await
        {
            Ok(_) => Ok(LabelChange::Applied),
            // GitHub answers 404 when the label is not on the issue
            Err(e) if is_not_found(&e) => {
                debug!(pr_number = id, label, "label already absent");
                Ok(LabelChange::AlreadyInState)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_comment(&self, id: u64, body: &str) -> Result<()> {
        debug!(pr_number = id, "creating PR comment");
        self.client
            .issues(&self.config.owner, &self.config.repo)
            .create_comment(id, body)
            .await?;
        debug!(pr_number = id, "created PR comment");
        Ok(())
    }

    async fn merge(&self, id: u64, strategy: MergeStrategy) -> Result<MergeResult> {
        debug!(pr_number = id, %strategy, "merging PR");

        let octocrab_method = match strategy {
            MergeStrategy::Squash => octocrab::params::pulls::MergeMethod::Squash,
            MergeStrategy::Merge => octocrab::params::pulls::MergeMethod::Merge,
            MergeStrategy::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
        };

        let result = self
            .client
            .pulls(&self.config.owner, &self.config.repo)
            .merge(id)
            .method(octocrab_method)
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Merge failed: {e}")))?;

        let merge_result = MergeResult {
            merged: result.merged,
            sha: result.sha,
            message: result.message,
        };

        debug!(
            pr_number = id,
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
