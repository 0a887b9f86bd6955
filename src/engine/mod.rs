//! Decision engine for label-driven merge automation
//!
//! Three-phase pattern, one CR at a time:
//! 1. Read - fetch a `Snapshot` of the CR (effectful, bounded)
//! 2. Evaluate - pick exactly one `Action` (pure, testable)
//! 3. Execute - perform the action's side effects (effectful)
//!
//! Closing a CR takes a detour through the cascade trigger, which picks the
//! siblings that fell behind the moved base and rebases them.

mod cascade;
mod evaluate;
mod execute;
mod router;
mod snapshot;

pub use cascade::{on_close, select_cascade_targets};
pub use evaluate::{Action, GiveUpReason, evaluate, is_eligible};
pub use execute::{Collaborators, ExecutionReport, MergedCr, execute, give_up_comment};
pub use router::{RunReport, handle_event};
pub use snapshot::{Snapshot, read_snapshot};
