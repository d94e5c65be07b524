//! Central session state: the active view, its visible stories, and the
//! triage sets that drive filtering.
//!
//! Every view activation is a fresh load; there is no stale-while-refresh
//! cache. Commands that mutate triage write the new set to the database
//! first; the in-memory set and the visible list only change once that
//! write has succeeded, so a failed write leaves the session as it was.

use std::collections::BTreeSet;

use anyhow::{bail, Context, Result};
use reqwest::redirect::Policy;

use crate::config::Config;
use crate::feed::{self, LoadPolicy, PageSizing};
use crate::hn::{FetchError, FirebaseClient, SearchClient, Story};
use crate::storage::{Database, TriageSets};

// ============================================================================
// HTTP Client Configuration
// ============================================================================

/// Create a custom redirect policy with loop detection and limited hops.
///
/// - Limits redirects to 3 hops maximum
/// - Detects redirect loops (same URL appearing twice in chain)
/// - Logs redirect chain for debugging
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        // Limit to 3 redirects
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        // Detect loops
        let url = attempt.url();
        for prev in attempt.previous() {
            if prev.as_str() == url.as_str() {
                return attempt.error("Redirect loop detected");
            }
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

// ============================================================================
// View Enum
// ============================================================================

/// Which feed is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Unread,
    Read,
    Saved,
}

impl View {
    /// Stable string form, used for the status line and session persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            View::Unread => "unread",
            View::Read => "read",
            View::Saved => "saved",
        }
    }

    /// Inverse of [`as_str`](Self::as_str). Unknown strings (from a future
    /// version's session state) come back as `None` rather than failing.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unread" => Some(View::Unread),
            "read" => Some(View::Read),
            "saved" => Some(View::Saved),
            _ => None,
        }
    }
}

/// Key under which the last active view is persisted between runs.
const SESSION_VIEW_KEY: &str = "session.view";

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub db: Database,
    pub search: SearchClient,
    pub firebase: FirebaseClient,

    /// Active view. Only changes after the view's load succeeds.
    pub view: View,
    /// Stories visible in the active view, score-descending.
    pub stories: Vec<Story>,
    /// In-memory triage sets, kept in sync with the database on every change.
    pub triage: TriageSets,

    policy: LoadPolicy,
    pub mark_read_on_open: bool,
}

impl App {
    pub async fn new(db: Database, config: &Config) -> Result<Self> {
        // Connection pooling and keepalive tuned for a burst of requests
        // against two hosts, then idleness.
        let http_client = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(std::time::Duration::from_secs(30))
            .tcp_keepalive(std::time::Duration::from_secs(60))
            .timeout(std::time::Duration::from_secs(30)) // Default request timeout
            .build()
            .context("Failed to build HTTP client")?;

        let search = SearchClient::new(
            http_client.clone(),
            config.search_base_url.clone(),
            config.min_score,
        );
        let firebase = FirebaseClient::new(http_client, config.firebase_base_url.clone());

        let triage = db.load_triage().await?;

        let sizing = if config.adaptive_paging {
            PageSizing::Adaptive
        } else {
            PageSizing::Fixed
        };
        let policy = LoadPolicy {
            target_count: config.target_count,
            page_limit: config.page_limit,
            sizing,
        };

        Ok(Self {
            db,
            search,
            firebase,
            view: View::Unread,
            stories: Vec::new(),
            triage,
            policy,
            mark_read_on_open: config.mark_read_on_open,
        })
    }

    /// The view the last session ended on, if one was recorded.
    pub async fn restore_view(&self) -> View {
        match self.db.get_state(SESSION_VIEW_KEY).await {
            Ok(Some(raw)) => View::parse(&raw).unwrap_or_default(),
            Ok(None) => View::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session state");
                View::default()
            }
        }
    }

    // ========================================================================
    // View Activation
    // ========================================================================

    /// Switch to `view`, loading its stories fresh from the network.
    ///
    /// The switch is transactional from the user's point of view: on any
    /// fetch error the current view and its stories stay on screen, and the
    /// caller surfaces one retryable message.
    pub async fn activate_view(&mut self, view: View) -> Result<(), FetchError> {
        let stories = match view {
            View::Unread => {
                feed::load_unread(&self.search, &self.policy, &self.triage.read, &self.triage.saved)
                    .await?
            }
            View::Read => feed::load_read(&self.search, &self.policy, &self.triage.read).await?,
            View::Saved => feed::load_saved(&self.search, &self.policy, &self.triage.saved).await?,
        };

        self.view = view;
        self.stories = stories;

        // Session persistence is best-effort; a failed write never blocks
        // the view switch.
        if let Err(e) = self.db.set_state(SESSION_VIEW_KEY, view.as_str()).await {
            tracing::warn!(error = %e, "Failed to persist session view");
        }
        Ok(())
    }

    /// Reload the active view.
    pub async fn refresh(&mut self) -> Result<(), FetchError> {
        self.activate_view(self.view).await
    }

    /// Story at a zero-based position in the visible list.
    pub fn story(&self, index: usize) -> Result<&Story> {
        match self.stories.get(index) {
            Some(story) => Ok(story),
            None => bail!(
                "No story at position {} (list has {})",
                index + 1,
                self.stories.len()
            ),
        }
    }

    // ========================================================================
    // Triage Commands
    // ========================================================================

    /// Write `read` through to the database, committing it as the in-memory
    /// set only once the write has succeeded.
    async fn commit_read_set(&mut self, read: BTreeSet<String>) -> Result<()> {
        self.db.save_read_set(&read).await?;
        self.triage.read = read;
        Ok(())
    }

    async fn commit_saved_set(&mut self, saved: BTreeSet<String>) -> Result<()> {
        self.db.save_saved_set(&saved).await?;
        self.triage.saved = saved;
        Ok(())
    }

    /// Toggle read state of the story at `index`, per the active view:
    ///
    /// - **Unread**: mark read; the story leaves the list
    /// - **Read**: unmark; the story leaves the list
    /// - **Saved**: flip the read flag; the list is not touched, since saved
    ///   stories stay visible regardless of read state
    pub async fn toggle_read(&mut self, index: usize) -> Result<String> {
        let story = self.story(index)?;
        let id = story.id.clone();
        let title = story.title.clone();

        let mut read = self.triage.read.clone();
        let now_read = if read.contains(&id) {
            read.remove(&id);
            false
        } else {
            read.insert(id.clone());
            true
        };
        self.commit_read_set(read).await?;
        tracing::debug!(id = %id, read = now_read, "Toggled read state");

        match self.view {
            View::Unread | View::Read => {
                self.stories.remove(index);
            }
            View::Saved => {}
        }

        Ok(if now_read {
            format!("Marked as read: {title}")
        } else {
            format!("Marked as unread: {title}")
        })
    }

    /// Toggle saved state of the story at `index`, per the active view:
    ///
    /// - **Unread**: save; the story leaves the list (saved ids are excluded
    ///   from the unread feed)
    /// - **Saved**: unsave; the story leaves the list
    /// - **Read**: flip the saved flag; the list is not touched
    pub async fn toggle_saved(&mut self, index: usize) -> Result<String> {
        let story = self.story(index)?;
        let id = story.id.clone();
        let title = story.title.clone();

        let mut saved = self.triage.saved.clone();
        let now_saved = if saved.contains(&id) {
            saved.remove(&id);
            false
        } else {
            saved.insert(id.clone());
            true
        };
        self.commit_saved_set(saved).await?;
        tracing::debug!(id = %id, saved = now_saved, "Toggled saved state");

        match self.view {
            View::Unread | View::Saved => {
                self.stories.remove(index);
            }
            View::Read => {}
        }

        Ok(if now_saved {
            format!("Saved: {title}")
        } else {
            format!("Unsaved: {title}")
        })
    }

    /// Ensure the story at `index` is in the read set (used when opening a
    /// story with `mark_read_on_open`). Unlike [`toggle_read`](Self::toggle_read)
    /// this never unmarks, and only the unread view drops the story from the
    /// visible list.
    pub async fn mark_read(&mut self, index: usize) -> Result<()> {
        let id = self.story(index)?.id.clone();
        if self.triage.read.contains(&id) {
            return Ok(());
        }
        let mut read = self.triage.read.clone();
        read.insert(id.clone());
        self.commit_read_set(read).await?;
        tracing::debug!(id = %id, "Marked read on open");
        if self.view == View::Unread {
            self.stories.remove(index);
        }
        Ok(())
    }

    // ========================================================================
    // Id-addressed Triage (one-shot commands)
    // ========================================================================

    /// Add an id to the read set. Returns false if it was already there.
    pub async fn mark_read_by_id(&mut self, id: &str) -> Result<bool> {
        if self.triage.read.contains(id) {
            return Ok(false);
        }
        let mut read = self.triage.read.clone();
        read.insert(id.to_string());
        self.commit_read_set(read).await?;
        Ok(true)
    }

    /// Remove an id from the read set. Returns false if it wasn't there.
    pub async fn unmark_read_by_id(&mut self, id: &str) -> Result<bool> {
        if !self.triage.read.contains(id) {
            return Ok(false);
        }
        let mut read = self.triage.read.clone();
        read.remove(id);
        self.commit_read_set(read).await?;
        Ok(true)
    }

    /// Flip an id's membership in the saved set. Returns the new state.
    pub async fn toggle_saved_by_id(&mut self, id: &str) -> Result<bool> {
        let mut saved = self.triage.saved.clone();
        let now_saved = if saved.contains(id) {
            saved.remove(id);
            false
        } else {
            saved.insert(id.to_string());
            true
        };
        self.commit_saved_set(saved).await?;
        Ok(now_saved)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn story(id: &str, score: i64) -> Story {
        Story {
            id: id.to_string(),
            title: format!("Story {id}"),
            url: None,
            score,
            by: "tester".to_string(),
            time: 1_700_000_000,
            comment_count: None,
        }
    }

    async fn test_app() -> App {
        let db = Database::open(":memory:").await.unwrap();
        App::new(db, &Config::default()).await.unwrap()
    }

    fn visible_ids(app: &App) -> Vec<&str> {
        app.stories.iter().map(|s| s.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_toggle_read_in_unread_view_removes_and_persists() {
        let mut app = test_app().await;
        app.view = View::Unread;
        app.stories = vec![story("1", 300), story("2", 200)];

        let msg = app.toggle_read(0).await.unwrap();
        assert!(msg.contains("Marked as read"));
        assert_eq!(visible_ids(&app), vec!["2"]);
        assert!(app.triage.is_read("1"));

        let stored = app.db.load_triage().await.unwrap();
        assert!(stored.is_read("1"));
    }

    #[tokio::test]
    async fn test_toggle_read_in_read_view_unmarks_and_removes() {
        let mut app = test_app().await;
        app.view = View::Read;
        app.triage.read.insert("1".to_string());
        app.stories = vec![story("1", 300)];

        let msg = app.toggle_read(0).await.unwrap();
        assert!(msg.contains("Marked as unread"));
        assert!(app.stories.is_empty());
        assert!(!app.triage.is_read("1"));

        let stored = app.db.load_triage().await.unwrap();
        assert!(!stored.is_read("1"));
    }

    #[tokio::test]
    async fn test_toggle_read_in_saved_view_keeps_story_visible() {
        let mut app = test_app().await;
        app.view = View::Saved;
        app.triage.saved.insert("1".to_string());
        app.stories = vec![story("1", 300)];

        app.toggle_read(0).await.unwrap();
        assert_eq!(visible_ids(&app), vec!["1"]);
        assert!(app.triage.is_read("1"));

        // Toggling again flips it back off; still visible.
        app.toggle_read(0).await.unwrap();
        assert_eq!(visible_ids(&app), vec!["1"]);
        assert!(!app.triage.is_read("1"));
    }

    #[tokio::test]
    async fn test_toggle_saved_in_unread_view_removes() {
        let mut app = test_app().await;
        app.view = View::Unread;
        app.stories = vec![story("1", 300), story("2", 200)];

        let msg = app.toggle_saved(1).await.unwrap();
        assert!(msg.contains("Saved"));
        assert_eq!(visible_ids(&app), vec!["1"]);
        assert!(app.triage.is_saved("2"));
    }

    #[tokio::test]
    async fn test_toggle_saved_in_saved_view_unsaves_and_removes() {
        let mut app = test_app().await;
        app.view = View::Saved;
        app.triage.saved.insert("1".to_string());
        app.stories = vec![story("1", 300)];

        let msg = app.toggle_saved(0).await.unwrap();
        assert!(msg.contains("Unsaved"));
        assert!(app.stories.is_empty());
        assert!(!app.triage.is_saved("1"));
    }

    #[tokio::test]
    async fn test_toggle_saved_in_read_view_flips_flag_only() {
        let mut app = test_app().await;
        app.view = View::Read;
        app.triage.read.insert("1".to_string());
        app.stories = vec![story("1", 300)];

        app.toggle_saved(0).await.unwrap();
        assert_eq!(visible_ids(&app), vec!["1"]);
        assert!(app.triage.is_saved("1"));
        // Read membership untouched.
        assert!(app.triage.is_read("1"));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_memory_and_list_untouched() {
        let mut app = test_app().await;
        app.view = View::Unread;
        app.stories = vec![story("1", 300)];

        // A closed pool fails every write.
        app.db.pool.close().await;

        assert!(app.toggle_read(0).await.is_err());
        assert!(!app.triage.is_read("1"));
        assert!(app.toggle_saved(0).await.is_err());
        assert!(!app.triage.is_saved("1"));
        // The story is still on screen and still addressable.
        assert_eq!(visible_ids(&app), vec!["1"]);
    }

    #[tokio::test]
    async fn test_mark_read_is_idempotent_and_view_aware() {
        let mut app = test_app().await;
        app.view = View::Saved;
        app.triage.saved.insert("1".to_string());
        app.stories = vec![story("1", 300)];

        app.mark_read(0).await.unwrap();
        assert!(app.triage.is_read("1"));
        // Saved view keeps the story; marking again is a no-op.
        assert_eq!(visible_ids(&app), vec!["1"]);
        app.mark_read(0).await.unwrap();
        assert!(app.triage.is_read("1"));
    }

    #[tokio::test]
    async fn test_story_index_out_of_range() {
        let mut app = test_app().await;
        app.stories = vec![story("1", 300)];
        assert!(app.story(1).is_err());
        assert!(app.toggle_read(5).await.is_err());
    }

    #[tokio::test]
    async fn test_mark_read_by_id_reports_prior_state() {
        let mut app = test_app().await;
        assert!(app.mark_read_by_id("42").await.unwrap());
        assert!(!app.mark_read_by_id("42").await.unwrap());
        assert!(app.unmark_read_by_id("42").await.unwrap());
        assert!(!app.unmark_read_by_id("42").await.unwrap());
    }

    #[tokio::test]
    async fn test_activate_view_failure_keeps_previous_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let db = Database::open(":memory:").await.unwrap();
        let config = Config {
            search_base_url: server.uri(),
            ..Config::default()
        };
        let mut app = App::new(db, &config).await.unwrap();
        app.view = View::Saved;
        app.stories = vec![story("1", 300)];
        app.triage.saved.insert("1".to_string());

        let err = app.activate_view(View::Unread).await.unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(500)));
        // Previous view and list survive the failed switch.
        assert_eq!(app.view, View::Saved);
        assert_eq!(visible_ids(&app), vec!["1"]);
    }

    #[tokio::test]
    async fn test_activate_view_loads_and_persists_session() {
        let server = MockServer::start().await;
        let body = serde_json::json!({
            "hits": [
                {"objectID": "1", "title": "First", "points": 150, "author": "a", "created_at_i": 1},
                {"objectID": "2", "title": "Second", "points": 250, "author": "b", "created_at_i": 2}
            ]
        });
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("page", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"hits": []})))
            .mount(&server)
            .await;

        let db = Database::open(":memory:").await.unwrap();
        let config = Config {
            search_base_url: server.uri(),
            ..Config::default()
        };
        let mut app = App::new(db, &config).await.unwrap();

        app.activate_view(View::Unread).await.unwrap();
        assert_eq!(app.view, View::Unread);
        // Score-descending regardless of response order.
        assert_eq!(visible_ids(&app), vec!["2", "1"]);
        assert_eq!(app.restore_view().await, View::Unread);
    }

    #[test]
    fn test_view_string_round_trip() {
        for view in [View::Unread, View::Read, View::Saved] {
            assert_eq!(View::parse(view.as_str()), Some(view));
        }
        assert_eq!(View::parse("garbage"), None);
    }
}
