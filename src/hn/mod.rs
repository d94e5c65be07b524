//! Hacker News API clients and the story model.
//!
//! Two remote collaborators, one story type:
//!
//! - [`search`] - the Algolia HN Search API: paginated story search with a
//!   minimum-score filter. This is what the feed loaders page through.
//! - [`firebase`] - the official Firebase HN API: an ordered id list plus
//!   per-item detail records, fetched as one concurrent batch. Backs the
//!   `top` command and single-story lookups.
//! - [`story`] - the [`Story`] model and the permissive wire-to-story
//!   mapping shared by both endpoints.
//!
//! Neither endpoint requires credentials. Both clients take their base URL at
//! construction so tests can point them at a mock server.

mod firebase;
mod search;
mod story;

pub use firebase::{FirebaseClient, TOP_STORIES_LIMIT};
pub use search::SearchClient;
pub use story::{FirebaseItem, SearchHit, Story};

use thiserror::Error;

/// Errors from either Hacker News endpoint.
///
/// There is no retry layer and no transient/permanent split: any failure
/// aborts the load in progress, and the user retries by re-running the
/// load. Individual hits that don't decode are filtered during mapping and
/// never reach this enum; only an undecodable response envelope is
/// `Malformed`.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with a non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Response body that is not the expected JSON shape
    #[error("Malformed response: {0}")]
    Malformed(String),
}
