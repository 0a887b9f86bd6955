//! mergebot - label-driven rebase-and-merge automation
//!
//! A CR (pull request / merge request) carrying the trigger label is kept
//! moving without a human: rebased when it falls behind its base, merged
//! once clean, approved, and green, and given up on (with a comment) when
//! something needs a person. Closing a CR cascades rebases to its siblings.
//!
//! # Architecture
//!
//! - [`event`] - normalize an inbound event payload
//! - [`engine`] - read a snapshot, evaluate (pure), execute
//! - [`platform`] - GitHub and GitLab behind one trait
//! - [`rebase`] - git subprocess rebase in per-CR working copies
//! - [`tracker`] - optional Jira transitions after merge
//! - [`config`] / [`auth`] - configuration and credential resolution

pub mod auth;
pub mod celebrate;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod platform;
pub mod rebase;
pub mod tracker;
pub mod types;

pub use error::{Error, Result};
