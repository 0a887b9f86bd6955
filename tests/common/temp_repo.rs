//! Temporary git repositories for rebase tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A bare "remote" plus a seed working copy used to push branches to it
pub struct TempGitRemote {
    dir: TempDir,
    remote: PathBuf,
    seed: PathBuf,
}

fn git_cmd(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_CONFIG_GLOBAL", "/dev/null")
        .args([
            "-c",
            "user.name=Test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "init.defaultBranch=main",
        ])
        .args(args);
    cmd
}

/// Run git in `dir`, returning whether it succeeded
pub fn git_succeeds(dir: &Path, args: &[&str]) -> bool {
    git_cmd(dir, args)
        .output()
        .expect("failed to run git")
        .status
        .success()
}

/// Run git in `dir`, panicking on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = git_cmd(dir, args).output().expect("failed to run git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

impl TempGitRemote {
    /// Bare remote with one commit on `main`
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let remote = dir.path().join("remote.git");
        let seed = dir.path().join("seed");

        git(dir.path(), &["init", "--bare", remote.to_str().unwrap()]);
        git(dir.path(), &["init", seed.to_str().unwrap()]);
        git(&seed, &["remote", "add", "origin", remote.to_str().unwrap()]);

        let repo = Self { dir, remote, seed };
        repo.commit_here("main", "a.txt", "one\ntwo\nthree\n", "initial");
        repo
    }

    /// Path of the bare remote, usable as a clone URL
    pub fn url(&self) -> String {
        self.remote.to_string_lossy().into_owned()
    }

    /// Scratch directory for working copies
    pub fn workdir(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    /// Create `branch` from `from` on the remote
    pub fn branch(&self, branch: &str, from: &str) {
        git(&self.seed, &["checkout", "-B", branch, from]);
        git(&self.seed, &["push", "origin", &format!("{branch}:refs/heads/{branch}")]);
    }

    /// Commit a file on an existing local `branch` and push it
    pub fn commit(&self, branch: &str, file: &str, contents: &str, message: &str) {
        git(&self.seed, &["checkout", branch]);
        self.commit_here(branch, file, contents, message);
    }

    fn commit_here(&self, branch: &str, file: &str, contents: &str, message: &str) {
        std::fs::write(self.seed.join(file), contents).expect("failed to write file");
        git(&self.seed, &["add", file]);
        git(&self.seed, &["commit", "-m", message]);
        git(&self.seed, &["push", "origin", &format!("HEAD:refs/heads/{branch}")]);
    }

    /// Commit SHA of a remote branch
    pub fn remote_sha(&self, branch: &str) -> String {
        git(&self.remote, &["rev-parse", &format!("refs/heads/{branch}")])
    }

    /// Whether `ancestor` is reachable from `descendant` on the remote
    pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        Command::new("git")
            .current_dir(&self.remote)
            .args(["merge-base", "--is-ancestor", ancestor, descendant])
            .status()
            .expect("failed to run git")
            .success()
    }

    /// Contents of `file` at the tip of a remote branch
    pub fn remote_file(&self, branch: &str, file: &str) -> Option<String> {
        let output = git_cmd(&self.remote, &["show", &format!("refs/heads/{branch}:{file}")])
            .output()
            .expect("failed to run git");
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Install a `pre-push` hook in `workcopy` that lands a contributor
    /// commit on `branch` of the remote while the push is in flight
    #[cfg(unix)]
    pub fn race_next_push(&self, workcopy: &Path, branch: &str, file: &str) {
        use std::os::unix::fs::PermissionsExt;

        let seed = self.seed.display();
        let script = format!(
            "#!/bin/sh\n\
             cat > /dev/null\n\
             unset GIT_DIR GIT_WORK_TREE GIT_INDEX_FILE GIT_PREFIX GIT_COMMON_DIR GIT_OBJECT_DIRECTORY\n\
             set -e\n\
             cd '{seed}'\n\
             git fetch -q origin\n\
             git checkout -q -B {branch} origin/{branch}\n\
             echo contributor > {file}\n\
             git add {file}\n\
             git -c user.name=Contributor -c user.email=c@example.com commit -q -m 'contributor push'\n\
             git push -q origin HEAD:refs/heads/{branch}\n"
        );
        let hook = workcopy.join(".git").join("hooks").join("pre-push");
        std::fs::create_dir_all(hook.parent().unwrap()).expect("failed to create hooks dir");
        std::fs::write(&hook, script).expect("failed to write hook");
        std::fs::set_permissions(&hook, std::fs::Permissions::from_mode(0o755))
            .expect("failed to chmod hook");
    }

    /// Number of commits on `head` that are not on `base`
    pub fn count_ahead(&self, base: &str, head: &str) -> usize {
        git(&self.remote, &["rev-list", "--count", &format!("{base}..{head}")])
            .parse()
            .expect("rev-list count is a number")
    }
}
