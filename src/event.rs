//! Inbound event normalization
//!
//! Turns a GitHub Actions event payload into one of the three events the
//! router understands. Payloads that do not point at a CR are not errors,
//! they just mean there is nothing to do.

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use serde::Deserialize;
use tracing::debug;

/// Normalized event, addressed by CR number
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A label was added to the CR
    LabelChanged {
        /// CR number
        cr_id: u64,
        /// Label that was added
        label: String,
    },
    /// Reviews, CI status, or the CR itself changed
    ReviewOrStatusChanged {
        /// CR number
        cr_id: u64,
    },
    /// The CR was merged or closed
    Closed {
        /// CR number
        cr_id: u64,
    },
}

impl Event {
    /// CR the event is about
    pub const fn cr_id(&self) -> u64 {
        match self {
            Self::LabelChanged { cr_id, .. }
            | Self::ReviewOrStatusChanged { cr_id }
            | Self::Closed { cr_id } => *cr_id,
        }
    }
}

/// What happened, before the CR is pinned down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// A label was added
    LabelChanged {
        /// Label that was added
        label: String,
    },
    /// Anything else that may change the decision
    ReviewOrStatusChanged,
    /// The CR was merged or closed
    Closed,
}

/// How the payload identifies its CR
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrRef {
    /// CR number given directly
    Id(u64),
    /// Only the head branch is known (commit status events)
    HeadBranch(String),
}

/// Parsed payload whose CR may still need a platform lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// What happened
    pub kind: EventKind,
    /// Which CR it happened to
    pub target: CrRef,
}

impl InboundEvent {
    /// Pin the event to a CR number, asking the platform if needed
    ///
    /// Returns `None` when a head branch has no open CR.
    pub async fn resolve(self, platform: &dyn PlatformService) -> Result<Option<Event>> {
        let cr_id = match self.target {
            CrRef::Id(id) => id,
            CrRef::HeadBranch(branch) => match platform.find_open_by_head(&branch).await? {
                Some(cr) => cr.id,
                None => {
                    debug!(branch = %branch, "no open CR for head branch");
                    return Ok(None);
                }
            },
        };

        Ok(Some(match self.kind {
            EventKind::LabelChanged { label } => Event::LabelChanged { cr_id, label },
            EventKind::ReviewOrStatusChanged => Event::ReviewOrStatusChanged { cr_id },
            EventKind::Closed => Event::Closed { cr_id },
        }))
    }
}

#[derive(Debug, Deserialize)]
struct Payload {
    action: Option<String>,
    number: Option<u64>,
    pull_request: Option<Numbered>,
    label: Option<Named>,
    workflow_run: Option<WithPullRequests>,
    check_suite: Option<WithPullRequests>,
    check_run: Option<WithPullRequests>,
    #[serde(default)]
    branches: Vec<Named>,
}

#[derive(Debug, Deserialize)]
struct Numbered {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WithPullRequests {
    #[serde(default)]
    pull_requests: Vec<Numbered>,
}

impl Payload {
    fn target(&self) -> Option<CrRef> {
        let first_pr = |source: &Option<WithPullRequests>| {
            source
                .as_ref()
                .and_then(|s| s.pull_requests.first())
                .map(|pr| pr.number)
        };

        self.number
            .or_else(|| self.pull_request.as_ref().map(|pr| pr.number))
            .or_else(|| first_pr(&self.workflow_run))
            .or_else(|| first_pr(&self.check_suite))
            .or_else(|| first_pr(&self.check_run))
            .map(CrRef::Id)
            .or_else(|| {
                self.branches
                    .first()
                    .map(|b| CrRef::HeadBranch(b.name.clone()))
            })
    }

    fn kind(&self) -> EventKind {
        match (self.action.as_deref(), &self.label) {
            (Some("closed"), _) => EventKind::Closed,
            (Some("labeled"), Some(label)) => EventKind::LabelChanged {
                label: label.name.clone(),
            },
            _ => EventKind::ReviewOrStatusChanged,
        }
    }
}

/// Normalize an event payload
///
/// `name` is the event name (`GITHUB_EVENT_NAME`), used for logging only:
/// the payload shape alone decides the result.
pub fn parse_event(name: Option<&str>, payload: &str) -> Result<Option<InboundEvent>> {
    let payload: Payload = serde_json::from_str(payload)
        .map_err(|e| Error::Event(format!("malformed event payload: {e}")))?;

    let Some(target) = payload.target() else {
        debug!(event = ?name, "payload does not reference a CR");
        return Ok(None);
    };

    let event = InboundEvent {
        kind: payload.kind(),
        target,
    };
    debug!(event = ?name, parsed = ?event, "parsed event");
    Ok(Some(event))
}
