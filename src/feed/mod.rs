//! Feed assembly: pagination over the search endpoint with triage filtering.
//!
//! Three loaders share one pagination skeleton over [`crate::hn::SearchClient`]:
//!
//! - **Unread**: accumulate stories *not* in either triage set until the
//!   target count is reached
//! - **Read** / **Saved**: locate exactly the ids a triage set names, stopping
//!   as soon as all of them are found
//!
//! All three stop unconditionally at the page limit, and every load is
//! fail-fast: the first fetch error aborts the remaining pages so the caller
//! can surface a single retryable message instead of a partial feed.

mod loader;

pub use loader::{
    load_read, load_saved, load_unread, LoadPolicy, PageSizing, DEFAULT_PAGE_LIMIT,
    DEFAULT_TARGET_COUNT,
};
