//! Evaluate command - show what the bot would do for a CR

use crate::cli::context::BotContext;
use mergebot::engine::read_snapshot;
use mergebot::error::Result;
use std::path::Path;

/// Read a CR and print the decided action without executing it
pub async fn run_evaluate(cr_id: u64, config: Option<&Path>) -> Result<()> {
    let ctx = BotContext::new(config).await?;
    let snapshot = read_snapshot(ctx.platform.as_ref(), cr_id).await?;
    let action = snapshot.evaluate(&ctx.config.policy);

    println!("#{cr_id} {}", snapshot.cr.title);
    println!("  state:    {}", snapshot.cr.mergeable_state);
    println!("  ci:       {}", snapshot.status.state);
    println!("  reviews:  {}", snapshot.reviews.len());
    println!("  action:   {action}");
    Ok(())
}
