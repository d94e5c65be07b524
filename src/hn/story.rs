use serde::Deserialize;

// ============================================================================
// Story
// ============================================================================

/// A Hacker News story, as displayed and triaged.
///
/// Immutable once constructed from an API response. Ids are strings end to
/// end: the search API already returns them that way, and the Firebase API's
/// numeric ids are stringified at the mapping boundary, so the persisted
/// read/saved sets never care which endpoint a story came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    pub id: String,
    pub title: String,
    /// Absent for text-only posts (Ask HN, etc.); those open their item page.
    pub url: Option<String>,
    pub score: i64,
    pub by: String,
    /// Creation time, epoch seconds.
    pub time: i64,
    pub comment_count: Option<i64>,
}

impl Story {
    /// The story's discussion page on news.ycombinator.com.
    pub fn hn_url(&self) -> String {
        format!("https://news.ycombinator.com/item?id={}", self.id)
    }

    /// The link a browser should open: the article URL, or the discussion
    /// page for URL-less posts.
    pub fn link(&self) -> String {
        self.url.clone().unwrap_or_else(|| self.hn_url())
    }
}

// ============================================================================
// Wire Types
// ============================================================================

/// One raw hit from the Algolia search endpoint.
///
/// Every field is optional at the wire level: a hit that cannot be mapped to
/// a [`Story`] is filtered out, never an error. Only an undecodable response
/// envelope is treated as malformed.
#[derive(Debug, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "objectID")]
    pub object_id: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub points: Option<i64>,
    pub author: Option<String>,
    pub created_at_i: Option<i64>,
    pub num_comments: Option<i64>,
}

impl SearchHit {
    /// Map a raw hit to a [`Story`], or `None` if it doesn't qualify.
    ///
    /// A hit lacking an id, a title, or a score is dropped. "Lacking" follows
    /// the truthy convention: an empty title or a score of 0 counts as
    /// missing, so score-0 stories never qualify.
    pub fn into_story(self) -> Option<Story> {
        let id = self.object_id.filter(|s| !s.is_empty())?;
        let title = self.title.filter(|s| !s.is_empty())?;
        let score = self.points.filter(|p| *p > 0)?;
        Some(Story {
            id,
            title,
            url: self.url.filter(|u| !u.is_empty()),
            score,
            by: self.author.unwrap_or_default(),
            time: self.created_at_i.unwrap_or(0),
            comment_count: self.num_comments,
        })
    }
}

/// One raw item record from the Firebase API (`/item/{id}.json`).
///
/// The endpoint returns JSON `null` for dead ids; callers handle that before
/// mapping. Field names differ from the search API (`by`/`score`/`time`/
/// `descendants`), but the qualification rules are the same.
#[derive(Debug, Deserialize)]
pub struct FirebaseItem {
    pub id: Option<u64>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub score: Option<i64>,
    pub by: Option<String>,
    pub time: Option<i64>,
    pub descendants: Option<i64>,
}

impl FirebaseItem {
    /// Map a raw item to a [`Story`] under the same truthy gates as
    /// [`SearchHit::into_story`].
    pub fn into_story(self) -> Option<Story> {
        let id = self.id?;
        let title = self.title.filter(|s| !s.is_empty())?;
        let score = self.score.filter(|p| *p > 0)?;
        Some(Story {
            id: id.to_string(),
            title,
            url: self.url.filter(|u| !u.is_empty()),
            score,
            by: self.by.unwrap_or_default(),
            time: self.time.unwrap_or(0),
            comment_count: self.descendants,
        })
    }
}
