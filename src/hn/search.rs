use serde::Deserialize;

use super::story::SearchHit;
use super::FetchError;

/// Response envelope from the search endpoint.
///
/// `hits` is required: an envelope without it is malformed, while the hits
/// themselves are filtered permissively during story mapping.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<SearchHit>,
}

/// Client for the Algolia HN Search API.
///
/// One page per call, awaited sequentially by the loaders; there is no
/// fan-out across pages. The base URL is injectable so tests can run against
/// a wiremock server.
#[derive(Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    base_url: String,
    min_score: i64,
}

impl SearchClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, min_score: i64) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            min_score,
        }
    }

    /// Fetch one page of stories scoring strictly above `min_score`.
    ///
    /// Returns the raw hits; mapping and triage filtering are the loader's
    /// job. An empty page means the result set is exhausted.
    pub async fn search_page(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<Vec<SearchHit>, FetchError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("tags", "story"),
                ("numericFilters", &format!("points>{}", self.min_score)),
                ("page", &page.to_string()),
                ("hitsPerPage", &page_size.to_string()),
            ])
            .send()
            .await
            .map_err(FetchError::Network)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::Network)?;
        let parsed: SearchResponse =
            serde_json::from_slice(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;

        tracing::debug!(
            page = page,
            page_size = page_size,
            hits = parsed.hits.len(),
            "Fetched search page"
        );

        Ok(parsed.hits)
    }
}
