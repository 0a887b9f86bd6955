//! Authentication for GitHub and GitLab
//!
//! Supports CLI-based auth (gh, glab) and environment variables.

use crate::config::EnvLookup;
use crate::error::{Error, Result};
use crate::types::Platform;
use tokio::process::Command;
use tracing::debug;

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from CLI tool (gh or glab)
    Cli,
    /// Token from environment variable
    EnvVar,
}

/// A resolved platform token
#[derive(Clone)]
pub struct PlatformAuth {
    /// The token itself
    pub token: String,
    /// Where it came from
    pub source: AuthSource,
}

impl std::fmt::Debug for PlatformAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformAuth")
            .field("token", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

/// Environment variables checked for a token, in priority order
pub const fn token_env_vars(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::GitHub => &["INPUT_GITHUB_TOKEN", "GITHUB_TOKEN", "GH_TOKEN"],
        Platform::GitLab => &["GITLAB_TOKEN", "GL_TOKEN"],
    }
}

/// Resolve a token from the environment only
pub fn token_from_env(platform: Platform, env: EnvLookup<'_>) -> Option<PlatformAuth> {
    token_env_vars(platform).iter().find_map(|key| {
        env(key).map(|token| {
            debug!(var = key, "using token from environment");
            PlatformAuth {
                token,
                source: AuthSource::EnvVar,
            }
        })
    })
}

/// Resolve a token: environment first, then the platform CLI
pub async fn get_platform_auth(platform: Platform, env: EnvLookup<'_>) -> Result<PlatformAuth> {
    if let Some(auth) = token_from_env(platform, env) {
        return Ok(auth);
    }

    let (program, vars) = match platform {
        Platform::GitHub => ("gh", token_env_vars(Platform::GitHub)),
        Platform::GitLab => ("glab", token_env_vars(Platform::GitLab)),
    };

    debug!(program, "no token in environment, asking CLI");
    let output = Command::new(program)
        .args(["auth", "token"])
        .output()
        .await
        .map_err(|e| {
            Error::Auth(format!(
                "no {platform} token found: set one of {} or install `{program}` ({e})",
                vars.join(", ")
            ))
        })?;

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() || token.is_empty() {
        return Err(Error::Auth(format!(
            "no {platform} token found: set one of {} or run `{program} auth login`",
            vars.join(", ")
        )));
    }

    Ok(PlatformAuth {
        token,
        source: AuthSource::Cli,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_token_wins_over_github_token() {
        let env = |key: &str| match key {
            "INPUT_GITHUB_TOKEN" => Some("from-action".to_string()),
            "GITHUB_TOKEN" => Some("from-runner".to_string()),
            _ => None,
        };
        let auth = token_from_env(Platform::GitHub, &env).unwrap();
        assert_eq!(auth.token, "from-action");
        assert_eq!(auth.source, AuthSource::EnvVar);
    }

    #[test]
    fn test_gitlab_ignores_github_vars() {
        let env = |key: &str| (key == "GITHUB_TOKEN").then(|| "gh".to_string());
        assert!(token_from_env(Platform::GitLab, &env).is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let auth = PlatformAuth {
            token: "hunter2".to_string(),
            source: AuthSource::Cli,
        };
        assert!(!format!("{auth:?}").contains("hunter2"));
    }
}
