//! State snapshot reader

use crate::config::Policy;
use crate::engine::evaluate::{Action, evaluate};
use crate::error::Result;
use crate::platform::PlatformService;
use crate::types::{ChangeRequest, Review, StatusCheck};
use tracing::debug;

/// Everything the evaluator looks at, read at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// The change request
    pub cr: ChangeRequest,
    /// All reviews, oldest first, not deduplicated by author
    pub reviews: Vec<Review>,
    /// Aggregated CI status of the head commit
    pub status: StatusCheck,
}

impl Snapshot {
    /// Evaluate this snapshot under a policy
    pub fn evaluate(&self, policy: &Policy) -> Action {
        evaluate(&self.cr, &self.reviews, &self.status, policy)
    }
}

/// Read the current state of a CR (pure read, no side effects)
pub async fn read_snapshot(platform: &dyn PlatformService, cr_id: u64) -> Result<Snapshot> {
    let cr = platform.get_change_request(cr_id).await?;
    let reviews = platform.list_reviews(cr_id).await?;
    let status = platform.combined_status(&cr.head_sha).await?;

    debug!(
        cr_id,
        open = cr.is_open,
        mergeable_state = %cr.mergeable_state,
        mergeable = ?cr.is_mergeable,
        labels = ?cr.labels,
        reviews = reviews.len(),
        ci = %status.state,
        "read snapshot"
    );

    Ok(Snapshot {
        cr,
        reviews,
        status,
    })
}
