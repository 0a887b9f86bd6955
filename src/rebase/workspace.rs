//! Per-CR working copies.

use super::git::run_git;
use super::{GitError, GitResult};
use crate::types::PlatformConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path of the working copy for one CR.
///
/// The repository directory is the percent-encoded `owner/repo` slug, so
/// distinct repositories (nested GitLab groups included) never share one.
pub fn workspace_path(root: &Path, repo: &PlatformConfig, cr_id: u64) -> PathBuf {
    root.join(urlencoding::encode(&repo.slug()).as_ref())
        .join(format!("cr-{cr_id}"))
}

/// Clone the remote into `dir`, or make an existing clone reusable.
///
/// A reused clone may hold a rebase interrupted by a crashed run; it is
/// aborted and the tree is reset before anything else happens.
pub(super) async fn prepare(dir: &Path, remote_url: &str, secret: Option<&str>) -> GitResult<()> {
    if dir.join(".git").is_dir() {
        debug!(dir = %dir.display(), "reusing working copy");
        run_git(dir, &["remote", "set-url", "origin", remote_url], secret).await?;
        // No rebase in progress is fine
        if run_git(dir, &["rebase", "--abort"], secret).await.is_err() {
            for state in ["rebase-merge", "rebase-apply"] {
                let state_dir = dir.join(".git").join(state);
                if state_dir.is_dir() {
                    debug!(dir = %state_dir.display(), "removing stale rebase state");
                    tokio::fs::remove_dir_all(&state_dir).await?;
                }
            }
        }
        run_git(dir, &["reset", "--hard"], secret).await?;
        run_git(dir, &["clean", "-fdx"], secret).await?;
        return Ok(());
    }

    let parent = dir.parent().ok_or_else(|| GitError::CommandFailed {
        command: "git clone".to_string(),
        stderr: format!("working copy path has no parent: {}", dir.display()),
    })?;
    tokio::fs::create_dir_all(parent).await?;

    // A leftover directory without .git is a half-finished clone
    if dir.exists() {
        tokio::fs::remove_dir_all(dir).await?;
    }

    let dir_str = dir.to_string_lossy();
    debug!(dir = %dir_str, "cloning working copy");
    run_git(parent, &["clone", "--no-tags", remote_url, &dir_str], secret).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Platform;

    #[test]
    fn test_workspace_path_is_per_cr() {
        let repo = PlatformConfig {
            platform: Platform::GitHub,
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            host: None,
        };
        let root = Path::new("/var/lib/mergebot");
        assert_eq!(
            workspace_path(root, &repo, 42),
            PathBuf::from("/var/lib/mergebot/acme%2Fwidgets/cr-42")
        );
        assert_ne!(workspace_path(root, &repo, 42), workspace_path(root, &repo, 43));
    }

    fn gitlab_repo(owner: &str, repo: &str) -> PlatformConfig {
        PlatformConfig {
            platform: Platform::GitLab,
            owner: owner.to_string(),
            repo: repo.to_string(),
            host: None,
        }
    }

    #[test]
    fn test_workspace_path_encodes_nested_groups() {
        assert_eq!(
            workspace_path(Path::new("/w"), &gitlab_repo("group/sub", "project"), 1),
            PathBuf::from("/w/group%2Fsub%2Fproject/cr-1")
        );
    }

    #[test]
    fn test_workspace_path_distinguishes_dashed_names() {
        let root = Path::new("/w");
        assert_ne!(
            workspace_path(root, &gitlab_repo("a-b", "c"), 1),
            workspace_path(root, &gitlab_repo("a", "b-c"), 1)
        );
        assert_ne!(
            workspace_path(root, &gitlab_repo("a/b", "c"), 1),
            workspace_path(root, &gitlab_repo("a-b", "c"), 1)
        );
    }
}
