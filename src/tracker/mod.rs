//! Issue-tracker integration
//!
//! Optional: when a CR merged under the close label, the issue keys in its
//! title are moved to done. Failures here never affect the merge.

mod jira;

pub use jira::JiraTracker;

use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

/// Bracketed title tokens, e.g. `[PROJ-123]`
static ISSUE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\[\]]+)\]").expect("issue token regex is valid"));

/// Issue tracker operations
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Move an issue to its done state
    async fn transition_to_done(&self, issue_key: &str) -> Result<()>;
}

/// Extract issue keys from a title, skipping reserved tokens
///
/// Tokens are trimmed and deduplicated, first occurrence wins. Reserved
/// tokens match case-insensitively.
pub fn extract_issue_tokens(title: &str, reserved: &[String]) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for capture in ISSUE_TOKEN.captures_iter(title) {
        let token = capture[1].trim();
        if token.is_empty() || reserved.iter().any(|r| r.eq_ignore_ascii_case(token)) {
            continue;
        }
        if !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
    }
    tokens
}
