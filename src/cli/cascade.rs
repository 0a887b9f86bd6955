//! Cascade command - show which siblings a close would rebase

use crate::cli::context::BotContext;
use mergebot::engine::on_close;
use mergebot::error::Result;
use std::path::Path;

/// Print the cascade targets for a CR without rebasing anything
pub async fn run_cascade(cr_id: u64, config: Option<&Path>) -> Result<()> {
    let ctx = BotContext::new(config).await?;
    let closed = ctx.platform.get_change_request(cr_id).await?;
    let targets = on_close(ctx.platform.as_ref(), &closed, &ctx.config.policy).await?;

    if targets.is_empty() {
        println!("No siblings of #{cr_id} need a rebase");
        return Ok(());
    }
    println!("Closing #{cr_id} would rebase:");
    for id in targets {
        println!("  #{id}");
    }
    Ok(())
}
