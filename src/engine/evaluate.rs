//! Action evaluation - the pure state machine
//!
//! This module contains the pure, testable decision logic. No I/O happens
//! here - the snapshot is passed in, and the same snapshot under the same
//! policy always yields the same action, so duplicate event deliveries are
//! safe to re-evaluate.

use crate::config::Policy;
use crate::types::{ChangeRequest, CiState, MergeableState, Review, ReviewState, StatusCheck};
use std::collections::BTreeSet;

/// Why the bot stopped automating a CR
///
/// `Display` renders the message shown to the CR author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GiveUpReason {
    /// Content conflicts with the base branch
    ConflictingFiles,
    /// A required status check failed
    BlockedByCi,
    /// Approval is required and nobody approved yet
    WaitForReviews,
    /// A reviewer requested changes
    AddressReviewerComments,
    /// Final mergeability check or the merge call itself failed
    MergeFailed,
    /// Fetch, replay, or push failed while rebasing
    RebaseFailed,
}

impl std::fmt::Display for GiveUpReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::ConflictingFiles => "Conflicting files",
            Self::BlockedByCi => "Blocked by CI",
            Self::WaitForReviews => "Wait for reviews",
            Self::AddressReviewerComments => "Address reviewer comments",
            Self::MergeFailed => "Unknown error when trying to merge, check log",
            Self::RebaseFailed => "Rebase failed, check logs",
        };
        f.write_str(text)
    }
}

/// The single next step for a CR
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// CI still running; the next delivered event re-evaluates
    Wait,
    /// Replay the head onto the tip of the base
    Rebase,
    /// Merge with the policy's strategy
    Merge,
    /// Comment with the reason and drop the enrollment labels
    GiveUp(GiveUpReason),
    /// Rebase each sibling that fell behind after a CR closed
    CascadeRebase(BTreeSet<u64>),
    /// Not enrolled; nothing to do
    Noop,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wait => write!(f, "wait"),
            Self::Rebase => write!(f, "rebase"),
            Self::Merge => write!(f, "merge"),
            Self::GiveUp(reason) => write!(f, "give up: {reason}"),
            Self::CascadeRebase(targets) => {
                let ids: Vec<String> = targets.iter().map(|id| format!("#{id}")).collect();
                write!(f, "cascade rebase: {}", ids.join(", "))
            }
            Self::Noop => write!(f, "noop"),
        }
    }
}

/// Whether a CR is enrolled: open and carrying an enrollment label
pub fn is_eligible(cr: &ChangeRequest, policy: &Policy) -> bool {
    cr.is_open && policy.enrollment_labels().any(|label| cr.has_label(label))
}

/// Decide the next action for a CR (PURE - no I/O, easily testable)
///
/// Precedence, first match wins:
/// 1. not enrolled -> `Noop`
/// 2. `dirty` -> give up on conflicts
/// 3. `behind` -> rebase
/// 4. `blocked` -> CI failure, CI pending, missing approval, requested changes
/// 5. not mergeable -> give up
/// 6. merge
///
/// Reviews are checked as a flat list, without collapsing to the latest
/// verdict per author.
#[must_use]
pub fn evaluate(
    cr: &ChangeRequest,
    reviews: &[Review],
    status: &StatusCheck,
    policy: &Policy,
) -> Action {
    if !is_eligible(cr, policy) {
        return Action::Noop;
    }

    match cr.mergeable_state {
        MergeableState::Dirty => return Action::GiveUp(GiveUpReason::ConflictingFiles),
        MergeableState::Behind => return Action::Rebase,
        MergeableState::Blocked => {
            if let Some(action) = evaluate_blocked(reviews, status, policy) {
                return action;
            }
        }
        MergeableState::Clean | MergeableState::Unknown => {}
    }

    if cr.is_mergeable == Some(true) {
        Action::Merge
    } else {
        Action::GiveUp(GiveUpReason::MergeFailed)
    }
}

/// Gates for a blocked CR; `None` means every gate passed
fn evaluate_blocked(reviews: &[Review], status: &StatusCheck, policy: &Policy) -> Option<Action> {
    match status.state {
        CiState::Failure => return Some(Action::GiveUp(GiveUpReason::BlockedByCi)),
        CiState::Pending => return Some(Action::Wait),
        CiState::Success => {}
    }

    let has_state = |state: ReviewState| reviews.iter().any(|r| r.state == state);

    if policy.require_approval && !has_state(ReviewState::Approved) {
        return Some(Action::GiveUp(GiveUpReason::WaitForReviews));
    }
    if has_state(ReviewState::ChangesRequested) {
        return Some(Action::GiveUp(GiveUpReason::AddressReviewerComments));
    }
    None
}
