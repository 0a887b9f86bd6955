//! Git subprocess rebaser.

use super::workspace::{self, workspace_path};
use super::{GitError, GitResult, RebaseOutcome, Rebaser};
use crate::config::{CommitIdentity, GitSettings};
use crate::types::{ChangeRequest, Platform, PlatformConfig};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Create a git Command with clean environment (no system/user config).
///
/// This ensures consistent behavior across machines by ignoring system and
/// user git configuration (rerere, hooks, aliases) and never prompting.
pub(super) fn git_command(workdir: &Path) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(workdir);
    cmd.env("GIT_CONFIG_NOSYSTEM", "1");
    cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
    cmd.env("GIT_TERMINAL_PROMPT", "0");
    cmd.kill_on_drop(true);
    cmd
}

/// Replace every occurrence of the secret with `***`.
fn redact(text: &str, secret: Option<&str>) -> String {
    match secret {
        Some(s) if !s.is_empty() => text.replace(s, "***"),
        _ => text.to_string(),
    }
}

async fn run(mut cmd: Command, args: &[&str], secret: Option<&str>) -> GitResult<Output> {
    let output = cmd.args(args).output().await?;

    if output.status.success() {
        Ok(output)
    } else {
        Err(GitError::CommandFailed {
            command: redact(&format!("git {}", args.join(" ")), secret),
            stderr: redact(&String::from_utf8_lossy(&output.stderr), secret),
        })
    }
}

/// Run a git command in the given working directory.
pub(super) async fn run_git(workdir: &Path, args: &[&str], secret: Option<&str>) -> GitResult<Output> {
    run(git_command(workdir), args, secret).await
}

/// Run a git command and return trimmed stdout.
async fn run_git_stdout(workdir: &Path, args: &[&str], secret: Option<&str>) -> GitResult<String> {
    let output = run_git(workdir, args, secret).await?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Rebaser that shells out to git in a per-CR working copy
pub struct GitRebaser {
    root: PathBuf,
    repo: PlatformConfig,
    identity: CommitIdentity,
    remote_url: String,
    secret: Option<String>,
}

impl GitRebaser {
    /// Rebaser cloning over HTTPS with a platform token
    pub fn new(settings: &GitSettings, repo: &PlatformConfig, token: &str) -> Self {
        let user = match repo.platform {
            Platform::GitHub => "x-access-token",
            Platform::GitLab => "oauth2",
        };
        let remote_url = format!(
            "https://{user}:{token}@{}/{}.git",
            repo.git_host(),
            repo.slug()
        );
        Self {
            root: settings.workdir.clone(),
            repo: repo.clone(),
            identity: settings.identity.clone(),
            remote_url,
            secret: Some(token.to_string()),
        }
    }

    /// Rebaser against an explicit remote (a path or URL without credentials)
    pub fn with_remote_url(settings: &GitSettings, repo: &PlatformConfig, remote_url: &str) -> Self {
        Self {
            root: settings.workdir.clone(),
            repo: repo.clone(),
            identity: settings.identity.clone(),
            remote_url: remote_url.to_string(),
            secret: None,
        }
    }

    /// Working copy used for a CR
    pub fn workspace_for(&self, cr_id: u64) -> PathBuf {
        workspace_path(&self.root, &self.repo, cr_id)
    }

    async fn try_rebase(&self, cr: &ChangeRequest) -> GitResult<()> {
        let secret = self.secret.as_deref();
        let dir = self.workspace_for(cr.id);

        workspace::prepare(&dir, &self.remote_url, secret).await?;
        run_git(&dir, &["fetch", "--prune", "origin"], secret).await?;

        let remote_base = format!("origin/{}", cr.base_ref);
        let remote_head = format!("origin/{}", cr.head_ref);
        run_git(&dir, &["checkout", "-B", &cr.base_ref, &remote_base], secret).await?;
        run_git(&dir, &["checkout", "-B", &cr.head_ref, &remote_head], secret).await?;

        // Lease against the head we fetched, so a concurrent push wins
        let expected_head = run_git_stdout(&dir, &["rev-parse", "HEAD"], secret).await?;

        self.replay(&dir, &cr.base_ref).await?;

        let lease = format!("--force-with-lease=refs/heads/{}:{expected_head}", cr.head_ref);
        let refspec = format!("HEAD:refs/heads/{}", cr.head_ref);
        match run_git(&dir, &["push", &lease, "origin", &refspec], secret).await {
            Ok(_) => Ok(()),
            Err(GitError::CommandFailed { stderr, .. })
                if stderr.contains("rejected") || stderr.contains("stale info") =>
            {
                Err(GitError::PushRejected { details: stderr })
            }
            Err(e) => Err(e),
        }
    }

    /// Replay the checked-out head onto `base`, honoring fixup!/squash! commits.
    async fn replay(&self, dir: &Path, base: &str) -> GitResult<()> {
        let secret = self.secret.as_deref();
        let name = format!("user.name={}", self.identity.name);
        let email = format!("user.email={}", self.identity.email);

        let mut cmd = git_command(dir);
        // Accept the generated todo list and messages as-is
        cmd.env("GIT_SEQUENCE_EDITOR", "true");
        cmd.env("GIT_EDITOR", "true");

        let args: [&str; 8] = [
            "-c",
            name.as_str(),
            "-c",
            email.as_str(),
            "rebase",
            "--interactive",
            "--autosquash",
            base,
        ];
        match run(cmd, &args, secret).await {
            Ok(_) => Ok(()),
            Err(GitError::CommandFailed { stderr, .. }) => {
                // Leave the working copy reusable for the next run
                let _ = run_git(dir, &["rebase", "--abort"], secret).await;
                Err(GitError::Conflict { details: stderr })
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Rebaser for GitRebaser {
    async fn rebase(&self, cr: &ChangeRequest) -> RebaseOutcome {
        info!(
            cr_id = cr.id,
            head = %cr.head_ref,
            base = %cr.base_ref,
            "rebasing"
        );
        match self.try_rebase(cr).await {
            Ok(()) => {
                debug!(cr_id = cr.id, "pushed rebased head");
                info!(cr_id = cr.id, "rebase pushed, a new CI run should start");
                RebaseOutcome::Success
            }
            Err(e) => {
                warn!(cr_id = cr.id, error = %e, "rebase failed");
                RebaseOutcome::Failure(e.to_string())
            }
        }
    }
}
