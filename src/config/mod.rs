//! Bot configuration
//!
//! Everything the bot needs from its deployment is resolved once, at startup,
//! from an optional TOML file layered under environment variables. The
//! resolved [`BotConfig`] is then threaded into each component; nothing below
//! this module reads the process environment.

mod file;

pub use file::{ConfigFile, GitSection, RepositorySection, TrackerSection, load_config_file};

use crate::error::{Error, Result};
use crate::types::{MergeStrategy, PlatformConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Default label that enrolls a CR into automation
pub const DEFAULT_TRIGGER_LABEL: &str = "merge-it";

/// Default label meaning "merge and mark the linked issues done"
pub const DEFAULT_CLOSE_LABEL: &str = "merge-it-and-close";

/// Policy knobs that parameterize evaluation and execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Label that marks a CR as enrolled in automation
    pub trigger_label: String,
    /// Alternate trigger label that also transitions linked issues on merge
    pub close_label: Option<String>,
    /// Merge method passed to the platform
    pub merge_strategy: MergeStrategy,
    /// Whether at least one approving review is required
    pub require_approval: bool,
    /// Remove and re-add the trigger label after a successful rebase
    pub relabel_after_rebase: bool,
    /// Post a celebratory comment after merging
    pub celebrate: bool,
    /// Bracketed title tokens that are never treated as issue keys
    pub reserved_issue_tokens: Vec<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            trigger_label: DEFAULT_TRIGGER_LABEL.to_string(),
            close_label: Some(DEFAULT_CLOSE_LABEL.to_string()),
            merge_strategy: MergeStrategy::Rebase,
            require_approval: true,
            relabel_after_rebase: false,
            celebrate: true,
            reserved_issue_tokens: vec!["internal".to_string(), "trivial".to_string()],
        }
    }
}

impl Policy {
    /// Labels that enroll a CR (trigger label, then close label if set)
    pub fn enrollment_labels(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.trigger_label.as_str()).chain(self.close_label.as_deref())
    }
}

/// Committer identity for rebased commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitIdentity {
    /// git `user.name`
    pub name: String,
    /// git `user.email`
    pub email: String,
}

/// Resolved git settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSettings {
    /// Root directory under which per-CR working copies live
    pub workdir: PathBuf,
    /// Identity used when replaying commits
    pub identity: CommitIdentity,
}

/// Resolved issue-tracker settings
#[derive(Clone, PartialEq, Eq)]
pub struct TrackerSettings {
    /// Jira base URL
    pub server: Url,
    /// Jira user (email)
    pub user: String,
    /// Jira API token
    pub token: String,
    /// Name of the transition that closes an issue
    pub done_transition: String,
}

impl std::fmt::Debug for TrackerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerSettings")
            .field("server", &self.server.as_str())
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .field("done_transition", &self.done_transition)
            .finish()
    }
}

/// Fully resolved bot configuration
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Decision policy
    pub policy: Policy,
    /// Repository identity
    pub platform: PlatformConfig,
    /// Git settings for the rebase procedure
    pub git: GitSettings,
    /// Issue tracker, when configured
    pub tracker: Option<TrackerSettings>,
    /// GitHub Actions run executing the bot (`GITHUB_RUN_ID`)
    pub ci_run_id: Option<u64>,
}

/// Environment lookup, injectable for tests
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Read a variable from the process environment, treating empty as unset
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

impl BotConfig {
    /// Load configuration from an optional file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, &process_env)
    }

    /// Load configuration with an explicit environment lookup
    pub fn load_with_env(path: Option<&Path>, env: EnvLookup<'_>) -> Result<Self> {
        let file = match path {
            Some(p) => load_config_file(p)?,
            None => ConfigFile::default(),
        };
        Self::resolve(file, env)
    }

    /// Layer environment overrides over a parsed config file
    pub fn resolve(file: ConfigFile, env: EnvLookup<'_>) -> Result<Self> {
        let mut policy = file.policy;

        if let Some(label) = env("INPUT_TRIGGER_LABEL") {
            policy.trigger_label = label;
        }
        if let Some(label) = env("INPUT_CLOSE_LABEL") {
            policy.close_label = Some(label);
        }
        if let Some(strategy) = env("INPUT_MERGE_STRATEGY") {
            policy.merge_strategy = strategy.parse().map_err(Error::Config)?;
        }
        if let Some(flag) = env("INPUT_REQUIRE_APPROVAL") {
            policy.require_approval = parse_bool("INPUT_REQUIRE_APPROVAL", &flag)?;
        }
        if policy.trigger_label.trim().is_empty() {
            return Err(Error::Config("trigger label must not be empty".to_string()));
        }
        policy.close_label = policy.close_label.filter(|l| !l.trim().is_empty());

        let slug = env("GITHUB_REPOSITORY")
            .or(file.repository.slug)
            .ok_or_else(|| {
                Error::Config(
                    "repository not configured: set GITHUB_REPOSITORY or [repository].slug"
                        .to_string(),
                )
            })?;
        let (owner, repo) = split_slug(&slug)?;

        let platform = PlatformConfig {
            platform: file.repository.platform,
            owner,
            repo,
            host: file.repository.host,
        };

        let git = GitSettings {
            workdir: file.git.workdir,
            identity: CommitIdentity {
                name: file.git.user_name,
                email: file.git.user_email,
            },
        };

        let tracker = resolve_tracker(file.tracker.unwrap_or_default(), env)?;

        let ci_run_id = env("GITHUB_RUN_ID")
            .map(|id| {
                id.trim().parse().map_err(|e| {
                    Error::Config(format!("GITHUB_RUN_ID: invalid run id '{id}': {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            policy,
            platform,
            git,
            tracker,
            ci_run_id,
        })
    }
}

fn resolve_tracker(section: TrackerSection, env: EnvLookup<'_>) -> Result<Option<TrackerSettings>> {
    let Some(user_token) = env("INPUT_JIRA_USER_TOKEN") else {
        return Ok(None);
    };
    let (user, token) = user_token.split_once(':').ok_or_else(|| {
        Error::Config("INPUT_JIRA_USER_TOKEN must be formatted as user:token".to_string())
    })?;

    let server = env("INPUT_JIRA_SERVER").or(section.server).ok_or_else(|| {
        Error::Config("Jira credentials given but no server: set INPUT_JIRA_SERVER".to_string())
    })?;
    let server = Url::parse(&server)
        .map_err(|e| Error::Config(format!("invalid Jira server URL '{server}': {e}")))?;

    Ok(Some(TrackerSettings {
        server,
        user: user.to_string(),
        token: token.to_string(),
        done_transition: section.done_transition,
    }))
}

/// Split `owner/repo`, keeping nested GitLab groups in the owner
fn split_slug(slug: &str) -> Result<(String, String)> {
    let slug = slug.trim().trim_end_matches('/');
    match slug.rsplit_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.trim_end_matches(".git").to_string()))
        }
        _ => Err(Error::Config(format!(
            "invalid repository '{slug}', expected owner/name"
        ))),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(Error::Config(format!("{key}: expected a boolean, got '{other}'"))),
    }
}
