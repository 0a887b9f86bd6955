//! Jira issue tracker using reqwest

use crate::config::TrackerSettings;
use crate::error::{Error, Result};
use crate::tracker::IssueTracker;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Deserialize)]
struct TransitionsResponse {
    transitions: Vec<Transition>,
}

#[derive(Deserialize)]
struct Transition {
    id: String,
    name: String,
}

/// Jira REST client (API v2, basic auth with an API token)
pub struct JiraTracker {
    client: Client,
    base_url: String,
    user: String,
    token: String,
    done_transition: String,
}

impl JiraTracker {
    /// Create a tracker from resolved settings
    pub fn new(settings: &TrackerSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::IssueTracker(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.server.as_str().trim_end_matches('/').to_string(),
            user: settings.user.clone(),
            token: settings.token.clone(),
            done_transition: settings.done_transition.clone(),
        })
    }

    fn transitions_url(&self, issue_key: &str) -> String {
        format!(
            "{}/rest/api/2/issue/{}/transitions",
            self.base_url,
            urlencoding::encode(issue_key)
        )
    }
}

#[async_trait]
impl IssueTracker for JiraTracker {
    async fn transition_to_done(&self, issue_key: &str) -> Result<()> {
        debug!(issue_key, "listing transitions");
        let url = self.transitions_url(issue_key);

        let response: TransitionsResponse = self
            .client
            .get(&url)
            .basic_auth(&self.user, Some(&self.token))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::IssueTracker(format!("{issue_key}: {e}")))?
            .json()
            .await?;

        let transition = response
            .transitions
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(&self.done_transition))
            .ok_or_else(|| {
                Error::IssueTracker(format!(
                    "{issue_key}: no '{}' transition available",
                    self.done_transition
                ))
            })?;

        debug!(issue_key, transition_id = %transition.id, "executing transition");
        self.client
            .post(&url)
            .basic_auth(&self.user, Some(&self.token))
            .json(&serde_json::json!({ "transition": { "id": transition.id } }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::IssueTracker(format!("{issue_key}: {e}")))?;

        debug!(issue_key, "transitioned issue to done");
        Ok(())
    }
}
