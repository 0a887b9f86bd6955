//! CLI commands

mod cascade;
mod context;
mod evaluate;
mod run;

pub use cascade::run_cascade;
pub use evaluate::run_evaluate;
pub use run::{RunOptions, run_event};
