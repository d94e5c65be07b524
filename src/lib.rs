//! sift: a terminal Hacker News reader with read/saved triage.
//!
//! The crate splits along the same seams the binary uses:
//!
//! - [`hn`] - API clients (search pagination, id-plus-detail top stories)
//!   and the story model
//! - [`feed`] - the loaders that page, filter against triage, and assemble
//!   each view's story list
//! - [`storage`] - SQLite-backed key-value state: the persisted read/saved
//!   sets and session state
//! - [`app`] - session state machine tying views, stories, and triage together
//! - [`ui`] - the interactive shell and list rendering
//! - [`config`] - optional TOML configuration
//! - [`util`] - formatting and link-safety helpers

pub mod app;
pub mod config;
pub mod feed;
pub mod hn;
pub mod storage;
pub mod ui;
pub mod util;
