//! Platform service construction

use crate::error::Result;
use crate::platform::{GitHubService, GitLabService, PlatformService};
use crate::types::{Platform, PlatformConfig};

/// Create the platform service for a repository
///
/// `own_run_id` is the CI run executing the bot; its own checks are left out
/// of the commit status.
pub fn create_platform_service(
    config: &PlatformConfig,
    token: &str,
    own_run_id: Option<u64>,
) -> Result<Box<dyn PlatformService>> {
    match config.platform {
        Platform::GitHub => Ok(Box::new(
            GitHubService::new(
                token,
                config.owner.clone(),
                config.repo.clone(),
                config.host.clone(),
            )?
            .excluding_run(own_run_id),
        )),
        Platform::GitLab => Ok(Box::new(GitLabService::new(
            token.to_string(),
            config.owner.clone(),
            config.repo.clone(),
            config.host.clone(),
        )?)),
    }
}
