use futures::{StreamExt, TryStreamExt};

use super::story::{FirebaseItem, Story};
use super::FetchError;

/// How many ids from the top-stories list get detail lookups.
pub const TOP_STORIES_LIMIT: usize = 100;

/// Client for the official Firebase Hacker News API.
///
/// The API is two-step: an ordered list of story ids, then one detail record
/// per id. Detail requests for a batch are fanned out concurrently (the
/// whole batch at once, no rate limiting) and collected in id-list order,
/// so a later stable sort keeps arrival order for equal scores.
#[derive(Clone)]
pub struct FirebaseClient {
    client: reqwest::Client,
    base_url: String,
}

impl FirebaseClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch the ordered list of current top story ids.
    pub async fn top_story_ids(&self) -> Result<Vec<u64>, FetchError> {
        let url = format!("{}/topstories.json", self.base_url);
        let body = self.get_bytes(&url).await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }

    /// Fetch one item detail record.
    ///
    /// The endpoint returns JSON `null` for dead or unknown ids; that maps to
    /// `Ok(None)`, not an error.
    pub async fn item(&self, id: u64) -> Result<Option<FirebaseItem>, FetchError> {
        let url = format!("{}/item/{}.json", self.base_url, id);
        let body = self.get_bytes(&url).await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Malformed(e.to_string()))
    }

    /// Two-step top-stories flow: take the first `limit` ids,
    /// fan out their detail requests in one concurrent batch, drop items that
    /// don't qualify as stories, and sort by score descending.
    ///
    /// Any single failed request fails the whole operation; partial results
    /// are discarded rather than shown.
    pub async fn top_stories(&self, limit: usize) -> Result<Vec<Story>, FetchError> {
        let mut ids = self.top_story_ids().await?;
        ids.truncate(limit);
        tracing::debug!(ids = ids.len(), "Fanning out item detail requests");

        // buffered() preserves input order, so ties in the later sort keep
        // the id-list arrival order.
        let batch = ids.len().max(1);
        let items: Vec<Option<FirebaseItem>> = futures::stream::iter(ids)
            .map(|id| self.item(id))
            .buffered(batch)
            .try_collect()
            .await?;

        let mut stories: Vec<Story> = items
            .into_iter()
            .flatten()
            .filter_map(FirebaseItem::into_story)
            .collect();
        stories.sort_by(|a, b| b.score.cmp(&a.score));

        tracing::info!(stories = stories.len(), "Loaded top stories");
        Ok(stories)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await.map_err(FetchError::Network)?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }
        Ok(response.bytes().await.map_err(FetchError::Network)?.to_vec())
    }
}
