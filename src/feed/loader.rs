use std::collections::BTreeSet;

use crate::hn::{FetchError, SearchClient, SearchHit, Story};

/// Unread stories to assemble before pagination stops.
pub const DEFAULT_TARGET_COUNT: usize = 20;

/// Hard ceiling on pages per load, uniform across all three loaders. Guards
/// against unbounded requests when target ids are stale or no longer qualify
/// under the score filter.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

const MIN_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 1000;

// ============================================================================
// Page Sizing
// ============================================================================

/// How many hits to request per search page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSizing {
    /// Always request 20 hits.
    Fixed,
    /// Widen the page so one request usually covers the wanted stories plus
    /// everything the triage filter will discard:
    /// `max(20, min(1000, wanted + excluded + 10))`.
    Adaptive,
}

impl PageSizing {
    /// `wanted` is the number of stories the loader is after; `excluded` is
    /// how many hits the filter may remove (the triage set sizes for the
    /// unread loader, 0 for the set loaders).
    pub fn page_size(self, wanted: usize, excluded: usize) -> u32 {
        match self {
            PageSizing::Fixed => MIN_PAGE_SIZE,
            PageSizing::Adaptive => {
                let widened = wanted.saturating_add(excluded).saturating_add(10);
                widened.clamp(MIN_PAGE_SIZE as usize, MAX_PAGE_SIZE as usize) as u32
            }
        }
    }
}

/// Pagination bounds and sizing for one load.
#[derive(Debug, Clone, Copy)]
pub struct LoadPolicy {
    pub target_count: usize,
    pub page_limit: u32,
    pub sizing: PageSizing,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            target_count: DEFAULT_TARGET_COUNT,
            page_limit: DEFAULT_PAGE_LIMIT,
            sizing: PageSizing::Adaptive,
        }
    }
}

// ============================================================================
// Loaders
// ============================================================================

/// Assemble up to `target_count` unread stories.
///
/// Pages through the search endpoint sequentially, dropping hits that don't
/// qualify as stories and filtering out ids in either triage set, until the
/// target is reached, the page limit is hit, or a page comes back empty
/// (result set exhausted). The accumulated list is stable-sorted by score
/// descending (ties keep arrival order) and truncated to the target.
///
/// Any fetch error aborts the remaining pagination immediately; partial
/// results are discarded, and the caller surfaces one retryable message.
pub async fn load_unread(
    search: &SearchClient,
    policy: &LoadPolicy,
    read: &BTreeSet<String>,
    saved: &BTreeSet<String>,
) -> Result<Vec<Story>, FetchError> {
    let page_size = policy
        .sizing
        .page_size(policy.target_count, read.len() + saved.len());

    let mut accumulated: Vec<Story> = Vec::new();
    let mut page: u32 = 0;

    while accumulated.len() < policy.target_count && page < policy.page_limit {
        let hits = search.search_page(page, page_size).await?;
        if hits.is_empty() {
            tracing::debug!(page = page, "Search exhausted");
            break;
        }

        let raw = hits.len();
        accumulated.extend(unread_survivors(hits, read, saved));
        tracing::debug!(
            page = page,
            raw_hits = raw,
            accumulated = accumulated.len(),
            "Filtered search page"
        );
        page += 1;
    }

    accumulated.sort_by(|a, b| b.score.cmp(&a.score));
    accumulated.truncate(policy.target_count);

    tracing::info!(
        stories = accumulated.len(),
        pages = page,
        "Assembled unread feed"
    );
    Ok(accumulated)
}

/// Load the stories whose ids are in the read set.
pub async fn load_read(
    search: &SearchClient,
    policy: &LoadPolicy,
    read: &BTreeSet<String>,
) -> Result<Vec<Story>, FetchError> {
    locate_targets(search, policy, read).await
}

/// Load the stories whose ids are in the saved set.
pub async fn load_saved(
    search: &SearchClient,
    policy: &LoadPolicy,
    saved: &BTreeSet<String>,
) -> Result<Vec<Story>, FetchError> {
    locate_targets(search, policy, saved).await
}

/// The inverted-filter skeleton shared by the read and saved loaders: page
/// through the same search results but keep only target ids, stopping early
/// once every requested id has been located. The page limit still applies as
/// a hard ceiling: triaged stories eventually age out of the score-filtered
/// result set, and their ids would otherwise never be found.
async fn locate_targets(
    search: &SearchClient,
    policy: &LoadPolicy,
    targets: &BTreeSet<String>,
) -> Result<Vec<Story>, FetchError> {
    if targets.is_empty() {
        return Ok(Vec::new());
    }

    let page_size = policy.sizing.page_size(targets.len(), 0);
    let mut remaining = targets.clone();
    let mut found: Vec<Story> = Vec::new();
    let mut page: u32 = 0;

    while !remaining.is_empty() && page < policy.page_limit {
        let hits = search.search_page(page, page_size).await?;
        if hits.is_empty() {
            tracing::debug!(page = page, "Search exhausted");
            break;
        }

        for hit in hits {
            let Some(story) = hit.into_story() else { continue };
            // remove() doubles as the dedupe: an id spread across pages
            // is only collected once.
            if remaining.remove(&story.id) {
                found.push(story);
            }
        }
        page += 1;
    }

    if !remaining.is_empty() {
        tracing::debug!(
            missing = remaining.len(),
            pages = page,
            "Target ids not located (stale or below the score filter)"
        );
    }

    found.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(found)
}

/// Map one page of raw hits to stories, dropping unqualified hits and any id
/// already triaged. Pure; the pagination loops own all the I/O.
fn unread_survivors(
    hits: Vec<SearchHit>,
    read: &BTreeSet<String>,
    saved: &BTreeSet<String>,
) -> Vec<Story> {
    hits.into_iter()
        .filter_map(SearchHit::into_story)
        .filter(|story| !read.contains(&story.id) && !saved.contains(&story.id))
        .collect()
}
