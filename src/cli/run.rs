//! Run command - handle one delivered event end to end

use crate::cli::context::BotContext;
use mergebot::engine::handle_event;
use mergebot::error::{Error, Result};
use mergebot::event::parse_event;
use std::path::Path;
use tracing::info;

/// Options for the run command
#[derive(Debug, Clone, Copy)]
pub struct RunOptions<'a> {
    /// Event payload file
    pub event_path: &'a Path,
    /// Event name, for logging
    pub event_name: Option<&'a str>,
    /// Config file
    pub config: Option<&'a Path>,
}

/// Run the bot for one event
pub async fn run_event(options: RunOptions<'_>) -> Result<()> {
    let payload = tokio::fs::read_to_string(options.event_path)
        .await
        .map_err(|e| {
            Error::Event(format!(
                "cannot read event payload {}: {e}",
                options.event_path.display()
            ))
        })?;

    // Parse before building collaborators: an irrelevant event needs no token
    let Some(inbound) = parse_event(options.event_name, &payload)? else {
        info!(event = ?options.event_name, "event does not reference a CR, nothing to do");
        return Ok(());
    };

    let ctx = BotContext::new(options.config).await?;

    let Some(event) = inbound.resolve(ctx.platform.as_ref()).await? else {
        info!("no open CR for event, nothing to do");
        return Ok(());
    };

    let report = handle_event(&event, &ctx.config.policy, ctx.collaborators()).await?;
    info!(
        cr_id = report.cr_id,
        action = %report.action,
        rebased = ?report.execution.rebased,
        merged = ?report.execution.merged,
        gave_up = ?report.execution.gave_up,
        "run complete"
    );
    Ok(())
}
