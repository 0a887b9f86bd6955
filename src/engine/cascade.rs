//! Cascade trigger
//!
//! Closing a CR moves the tip of its base branch. That can only make siblings
//! newly `behind`, so only enrolled siblings in that state are re-fed.

use crate::config::Policy;
use crate::engine::evaluate::is_eligible;
use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{ChangeRequest, MergeableState};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Pick the siblings of a closed CR that need a rebase (PURE)
pub fn select_cascade_targets(
    closed: &ChangeRequest,
    siblings: &[ChangeRequest],
    policy: &Policy,
) -> BTreeSet<u64> {
    siblings
        .iter()
        .filter(|s| s.id != closed.id && s.base_ref == closed.base_ref)
        .filter(|s| is_eligible(s, policy) && s.mergeable_state == MergeableState::Behind)
        .map(|s| s.id)
        .collect()
}

/// Enumerate open siblings sharing the closed CR's base and select targets
pub async fn on_close(
    platform: &dyn PlatformService,
    closed: &ChangeRequest,
    policy: &Policy,
) -> Result<BTreeSet<u64>> {
    info!(
        cr_id = closed.id,
        base = %closed.base_ref,
        "CR closed, looking for siblings sharing its base"
    );

    let siblings = platform.list_open_by_base(&closed.base_ref).await?;
    for sibling in &siblings {
        debug!(
            cr_id = sibling.id,
            eligible = is_eligible(sibling, policy),
            mergeable_state = %sibling.mergeable_state,
            "found sibling"
        );
    }

    let targets = select_cascade_targets(closed, &siblings, policy);
    info!(cr_id = closed.id, targets = ?targets, "cascade targets selected");
    Ok(targets)
}
