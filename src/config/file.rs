//! On-disk configuration file (`mergebot.toml`).

use super::Policy;
use crate::error::{Error, Result};
use crate::types::Platform;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default root for per-CR working copies.
const DEFAULT_WORKDIR: &str = "/tmp/mergebot";

/// Default committer name for rebased commits.
const DEFAULT_USER_NAME: &str = "mergebot[bot]";

/// Default committer email for rebased commits.
const DEFAULT_USER_EMAIL: &str = "mergebot[bot]@users.noreply.github.com";

/// Raw contents of a config file. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// `[policy]`
    pub policy: Policy,
    /// `[repository]`
    pub repository: RepositorySection,
    /// `[git]`
    pub git: GitSection,
    /// `[tracker]`
    pub tracker: Option<TrackerSection>,
}

/// `[repository]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySection {
    /// Hosting platform
    pub platform: Platform,
    /// `owner/name`; `GITHUB_REPOSITORY` takes precedence
    pub slug: Option<String>,
    /// Enterprise / self-hosted host name
    pub host: Option<String>,
}

/// `[git]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSection {
    /// Root for per-CR working copies
    pub workdir: PathBuf,
    /// Committer name
    pub user_name: String,
    /// Committer email
    pub user_email: String,
}

impl Default for GitSection {
    fn default() -> Self {
        Self {
            workdir: PathBuf::from(DEFAULT_WORKDIR),
            user_name: DEFAULT_USER_NAME.to_string(),
            user_email: DEFAULT_USER_EMAIL.to_string(),
        }
    }
}

/// `[tracker]` section. Credentials come from the environment only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSection {
    /// Jira base URL; `INPUT_JIRA_SERVER` takes precedence
    pub server: Option<String>,
    /// Transition name that marks an issue done
    pub done_transition: String,
}

impl Default for TrackerSection {
    fn default() -> Self {
        Self {
            server: None,
            done_transition: "Done".to_string(),
        }
    }
}

/// Load a config file from disk.
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MergeStrategy;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let err = load_config_file(&temp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mergebot.toml");
        fs::write(
            &path,
            r#"
[policy]
trigger_label = "ship-it"
merge_strategy = "squash"

[repository]
platform = "gitlab"
slug = "group/project"
"#,
        )
        .unwrap();

        let file = load_config_file(&path).unwrap();
        assert_eq!(file.policy.trigger_label, "ship-it");
        assert_eq!(file.policy.merge_strategy, MergeStrategy::Squash);
        assert!(file.policy.require_approval);
        assert_eq!(file.repository.platform, Platform::GitLab);
        assert_eq!(file.git.user_name, DEFAULT_USER_NAME);
        assert!(file.tracker.is_none());
    }

    #[test]
    fn test_tracker_section_defaults_transition() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mergebot.toml");
        fs::write(&path, "[tracker]\nserver = \"https://jira.example.com\"\n").unwrap();

        let file = load_config_file(&path).unwrap();
        let tracker = file.tracker.unwrap();
        assert_eq!(tracker.server.as_deref(), Some("https://jira.example.com"));
        assert_eq!(tracker.done_transition, "Done");
    }

    #[test]
    fn test_malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mergebot.toml");
        fs::write(&path, "[policy\ntrigger_label = 3").unwrap();
        assert!(matches!(load_config_file(&path), Err(Error::Config(_))));
    }
}
