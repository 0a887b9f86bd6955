//! Shared command context for CLI commands
//!
//! Extracts common setup code shared by run, evaluate, and cascade commands.

use mergebot::auth::get_platform_auth;
use mergebot::celebrate::{Celebration, DogCeo};
use mergebot::config::{BotConfig, process_env};
use mergebot::engine::Collaborators;
use mergebot::error::Result;
use mergebot::platform::{PlatformService, create_platform_service};
use mergebot::rebase::GitRebaser;
use mergebot::tracker::{IssueTracker, JiraTracker};
use std::path::Path;
use tracing::debug;

/// Shared context for CLI commands that interact with the platform
///
/// This struct encapsulates the common setup needed by every command:
/// - Loading configuration (file + environment)
/// - Resolving the platform token
/// - Creating the platform service
/// - Building the rebaser, tracker, and celebration collaborators
pub struct BotContext {
    /// Resolved configuration
    pub config: BotConfig,
    /// Platform service (GitHub/GitLab)
    pub platform: Box<dyn PlatformService>,
    /// Git rebaser for this repository
    pub rebaser: GitRebaser,
    /// Issue tracker, when Jira credentials are configured
    pub tracker: Option<JiraTracker>,
    /// Celebration source, when celebrating is enabled
    pub celebration: Option<DogCeo>,
}

impl BotContext {
    /// Create a new command context
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = BotConfig::load(config_path)?;
        debug!(
            platform = %config.platform.platform,
            repo = %config.platform.slug(),
            policy = ?config.policy,
            "loaded configuration"
        );

        let auth = get_platform_auth(config.platform.platform, &process_env).await?;
        debug!(source = ?auth.source, "resolved platform token");

        let platform =
            create_platform_service(&config.platform, &auth.token, config.ci_run_id)?;
        let rebaser = GitRebaser::new(&config.git, &config.platform, &auth.token);
        let tracker = config.tracker.as_ref().map(JiraTracker::new).transpose()?;
        let celebration = if config.policy.celebrate {
            Some(DogCeo::new()?)
        } else {
            None
        };

        Ok(Self {
            config,
            platform,
            rebaser,
            tracker,
            celebration,
        })
    }

    /// Borrow the collaborators the engine drives
    pub fn collaborators(&self) -> Collaborators<'_> {
        Collaborators {
            platform: self.platform.as_ref(),
            rebaser: &self.rebaser,
            tracker: self.tracker.as_ref().map(|t| t as &dyn IssueTracker),
            celebration: self.celebration.as_ref().map(|c| c as &dyn Celebration),
        }
    }
}
