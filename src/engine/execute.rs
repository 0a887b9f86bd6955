//! Action execution - effectful operations
//!
//! This module contains the effectful code that carries out an `Action`
//! (decided by the pure evaluator) via the platform, the rebaser, and the
//! optional issue tracker.

use crate::celebrate::{Celebration, FALLBACK_CELEBRATION, celebration_comment};
use crate::config::Policy;
use crate::engine::evaluate::{Action, GiveUpReason};
use crate::error::Result;
use crate::platform::PlatformService;
use crate::rebase::{RebaseOutcome, Rebaser};
use crate::tracker::{IssueTracker, extract_issue_tokens};
use crate::types::{ChangeRequest, LabelChange};
use tracing::{debug, info, warn};

/// External collaborators the executor drives
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    /// Platform API
    pub platform: &'a dyn PlatformService,
    /// Rebase procedure
    pub rebaser: &'a dyn Rebaser,
    /// Issue tracker, when configured
    pub tracker: Option<&'a dyn IssueTracker>,
    /// Celebration source, when enabled
    pub celebration: Option<&'a dyn Celebration>,
}

/// What an execution actually did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// CRs that received a comment, in order (repeats allowed)
    pub commented: Vec<u64>,
    /// CRs the bot gave up on, with the reason
    pub gave_up: Vec<(u64, GiveUpReason)>,
    /// Labels removed, as `(cr, label)`
    pub labels_removed: Vec<(u64, String)>,
    /// Labels that were already absent when removal was requested
    pub labels_already_absent: Vec<(u64, String)>,
    /// Labels (re-)added, as `(cr, label)`
    pub labels_added: Vec<(u64, String)>,
    /// CRs rebased and pushed
    pub rebased: Vec<u64>,
    /// Merge commit SHA, when the merge went through
    pub merged: Option<MergedCr>,
    /// Issue keys moved to done
    pub issues_transitioned: Vec<String>,
    /// Issue keys whose transition failed
    pub issues_failed: Vec<String>,
}

/// A CR merged during execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedCr {
    /// CR number
    pub id: u64,
    /// Merge commit SHA, if reported
    pub sha: Option<String>,
}

impl ExecutionReport {
    /// Check if the bot gave up on any CR
    #[must_use]
    pub fn gave_up_any(&self) -> bool {
        !self.gave_up.is_empty()
    }
}

/// Render the give-up comment
pub fn give_up_comment(reason: GiveUpReason) -> String {
    format!(":rotating_light: <b>Giving up on autorebase:</b> {reason}")
}

/// Execute one action for a CR (EFFECTFUL)
///
/// For `CascadeRebase`, `cr` is the CR whose closing triggered the cascade.
///
/// # Returns
/// An `ExecutionReport` describing the side effects performed
pub async fn execute(
    action: &Action,
    cr: &ChangeRequest,
    policy: &Policy,
    collab: Collaborators<'_>,
) -> Result<ExecutionReport> {
    let mut report = ExecutionReport::default();

    match action {
        Action::Noop => debug!(cr_id = cr.id, "not enrolled, nothing to do"),
        Action::Wait => info!(cr_id = cr.id, "CI still pending, letting CI finish"),
        Action::GiveUp(reason) => give_up(cr, *reason, policy, collab, &mut report).await?,
        Action::Rebase => rebase(cr, policy, collab, &mut report).await?,
        Action::Merge => merge(cr, policy, collab, &mut report).await?,
        Action::CascadeRebase(targets) => {
            for &target_id in targets {
                let target = collab.platform.get_change_request(target_id).await?;
                collab
                    .platform
                    .create_comment(
                        target_id,
                        &format!("PR #{} was just merged/closed. Rebasing...", cr.id),
                    )
                    .await?;
                report.commented.push(target_id);
                rebase(&target, policy, collab, &mut report).await?;
            }
        }
    }

    Ok(report)
}

/// Comment with the reason and drop every enrollment label
async fn give_up(
    cr: &ChangeRequest,
    reason: GiveUpReason,
    policy: &Policy,
    collab: Collaborators<'_>,
    report: &mut ExecutionReport,
) -> Result<()> {
    info!(cr_id = cr.id, %reason, "giving up");
    collab
        .platform
        .create_comment(cr.id, &give_up_comment(reason))
        .await?;
    report.commented.push(cr.id);
    report.gave_up.push((cr.id, reason));

    for label in policy.enrollment_labels() {
        match collab.platform.remove_label(cr.id, label).await? {
            LabelChange::Applied => {
                debug!(cr_id = cr.id, label, "removed label");
                report.labels_removed.push((cr.id, label.to_string()));
            }
            LabelChange::AlreadyInState => {
                debug!(cr_id = cr.id, label, "label was already removed");
                report.labels_already_absent.push((cr.id, label.to_string()));
            }
        }
    }
    Ok(())
}

async fn rebase(
    cr: &ChangeRequest,
    policy: &Policy,
    collab: Collaborators<'_>,
    report: &mut ExecutionReport,
) -> Result<()> {
    match collab.rebaser.rebase(cr).await {
        RebaseOutcome::Success => {
            report.rebased.push(cr.id);
            if policy.relabel_after_rebase {
                cycle_enrollment_labels(cr, policy, collab, report).await?;
            }
            Ok(())
        }
        RebaseOutcome::Failure(detail) => {
            warn!(cr_id = cr.id, detail = %detail, "rebase failed");
            give_up(cr, GiveUpReason::RebaseFailed, policy, collab, report).await
        }
    }
}

/// Remove then re-add the enrollment labels the CR carries, provoking a
/// fresh label event and therefore a fresh run
async fn cycle_enrollment_labels(
    cr: &ChangeRequest,
    policy: &Policy,
    collab: Collaborators<'_>,
    report: &mut ExecutionReport,
) -> Result<()> {
    for label in policy.enrollment_labels().filter(|l| cr.has_label(l)) {
        debug!(cr_id = cr.id, label, "cycling label");
        collab.platform.remove_label(cr.id, label).await?;
        collab.platform.add_label(cr.id, label).await?;
        report.labels_added.push((cr.id, label.to_string()));
    }
    Ok(())
}

async fn merge(
    cr: &ChangeRequest,
    policy: &Policy,
    collab: Collaborators<'_>,
    report: &mut ExecutionReport,
) -> Result<()> {
    info!(cr_id = cr.id, strategy = %policy.merge_strategy, "merging");

    let result = match collab.platform.merge(cr.id, policy.merge_strategy).await {
        Ok(result) if result.merged => result,
        Ok(result) => {
            // Merge API returned but didn't merge
            warn!(cr_id = cr.id, message = ?result.message, "platform refused merge");
            return give_up(cr, GiveUpReason::MergeFailed, policy, collab, report).await;
        }
        Err(e) => {
            warn!(cr_id = cr.id, error = %e, "merge call failed");
            return give_up(cr, GiveUpReason::MergeFailed, policy, collab, report).await;
        }
    };

    info!(cr_id = cr.id, sha = ?result.sha, "merged");
    report.merged = Some(MergedCr {
        id: cr.id,
        sha: result.sha,
    });

    // Everything below is best-effort: the merge already happened
    if policy.celebrate {
        celebrate(cr, collab, report).await;
    }

    let closing = policy.close_label.as_deref().is_some_and(|l| cr.has_label(l));
    if let (true, Some(tracker)) = (closing, collab.tracker) {
        transition_issues(cr, policy, tracker, report).await;
    }

    Ok(())
}

async fn celebrate(cr: &ChangeRequest, collab: Collaborators<'_>, report: &mut ExecutionReport) {
    let body = match collab.celebration {
        Some(source) => match source.image_url().await {
            Ok(url) => celebration_comment(&url),
            Err(e) => {
                warn!(cr_id = cr.id, error = %e, "could not fetch celebration image");
                FALLBACK_CELEBRATION.to_string()
            }
        },
        None => FALLBACK_CELEBRATION.to_string(),
    };

    match collab.platform.create_comment(cr.id, &body).await {
        Ok(()) => report.commented.push(cr.id),
        Err(e) => warn!(cr_id = cr.id, error = %e, "could not post celebration comment"),
    }
}

async fn transition_issues(
    cr: &ChangeRequest,
    policy: &Policy,
    tracker: &dyn IssueTracker,
    report: &mut ExecutionReport,
) {
    for key in extract_issue_tokens(&cr.title, &policy.reserved_issue_tokens) {
        debug!(cr_id = cr.id, issue = %key, "found issue key");
        match tracker.transition_to_done(&key).await {
            Ok(()) => {
                info!(cr_id = cr.id, issue = %key, "transitioned issue to done");
                report.issues_transitioned.push(key);
            }
            Err(e) => {
                warn!(cr_id = cr.id, issue = %key, error = %e, "failed to transition issue to done");
                report.issues_failed.push(key);
            }
        }
    }
}
