//! Event routing
//!
//! One normalized event in, one action out. Closing a CR routes through the
//! cascade trigger; everything else re-evaluates the CR from a fresh snapshot.

use crate::config::Policy;
use crate::engine::cascade::on_close;
use crate::engine::evaluate::Action;
use crate::engine::execute::{Collaborators, ExecutionReport, execute};
use crate::engine::snapshot::read_snapshot;
use crate::error::Result;
use crate::event::Event;
use tracing::info;

/// Result of handling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// CR the event was about
    pub cr_id: u64,
    /// Action chosen
    pub action: Action,
    /// Side effects performed
    pub execution: ExecutionReport,
}

/// Handle one event end to end: read, evaluate, execute
pub async fn handle_event(
    event: &Event,
    policy: &Policy,
    collab: Collaborators<'_>,
) -> Result<RunReport> {
    let cr_id = event.cr_id();

    let (cr, action) = match event {
        Event::Closed { .. } => {
            let closed = collab.platform.get_change_request(cr_id).await?;
            let targets = on_close(collab.platform, &closed, policy).await?;
            let action = if targets.is_empty() {
                Action::Noop
            } else {
                Action::CascadeRebase(targets)
            };
            (closed, action)
        }
        Event::LabelChanged { label, .. } => {
            info!(cr_id, label = %label, "label changed");
            let snapshot = read_snapshot(collab.platform, cr_id).await?;
            let action = snapshot.evaluate(policy);
            (snapshot.cr, action)
        }
        Event::ReviewOrStatusChanged { .. } => {
            let snapshot = read_snapshot(collab.platform, cr_id).await?;
            let action = snapshot.evaluate(policy);
            (snapshot.cr, action)
        }
    };

    info!(cr_id, action = %action, "decided");
    let execution = execute(&action, &cr, policy, collab).await?;

    Ok(RunReport {
        cr_id,
        action,
        execution,
    })
}
