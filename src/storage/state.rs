use std::collections::BTreeSet;

use anyhow::Result;

use super::schema::Database;
use super::types::TriageSets;

/// Key holding the read set, a JSON array of id strings.
pub(crate) const READ_SET_KEY: &str = "triage.read";
/// Key holding the saved set, same shape.
pub(crate) const SAVED_SET_KEY: &str = "triage.saved";

impl Database {
    // ========================================================================
    // Application State Operations
    // ========================================================================

    /// Get a single state value by key.
    ///
    /// Keys use dotted convention: `triage.read`, `triage.saved`, etc.
    ///
    /// # Returns
    ///
    /// The stored value if the key exists, or `None` if not set.
    pub async fn get_state(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM app_state WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    /// Set a state value (UPSERT).
    ///
    /// Inserts the key-value pair if it doesn't exist, or updates the value and
    /// timestamp if the key already exists.
    pub async fn set_state(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO app_state (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ========================================================================
    // Triage Set Persistence
    // ========================================================================

    /// Load both triage sets.
    ///
    /// A missing key means the set has never been written and loads as empty.
    /// A value that doesn't parse as a JSON string array also loads as empty,
    /// with a warning; the next save overwrites it with a well-formed array.
    pub async fn load_triage(&self) -> Result<TriageSets> {
        let read = match self.get_state(READ_SET_KEY).await? {
            Some(raw) => parse_id_set(READ_SET_KEY, &raw),
            None => BTreeSet::new(),
        };
        let saved = match self.get_state(SAVED_SET_KEY).await? {
            Some(raw) => parse_id_set(SAVED_SET_KEY, &raw),
            None => BTreeSet::new(),
        };

        tracing::debug!(read = read.len(), saved = saved.len(), "Loaded triage sets");
        Ok(TriageSets { read, saved })
    }

    /// Persist the read set as a JSON array of id strings.
    pub async fn save_read_set(&self, set: &BTreeSet<String>) -> Result<()> {
        self.set_state(READ_SET_KEY, &serde_json::to_string(set)?)
            .await
    }

    /// Persist the saved set as a JSON array of id strings.
    pub async fn save_saved_set(&self, set: &BTreeSet<String>) -> Result<()> {
        self.set_state(SAVED_SET_KEY, &serde_json::to_string(set)?)
            .await
    }

    /// Drop both triage sets. Used by `--reset-state`.
    pub async fn clear_triage(&self) -> Result<()> {
        sqlx::query("DELETE FROM app_state WHERE key IN (?, ?)")
            .bind(READ_SET_KEY)
            .bind(SAVED_SET_KEY)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn parse_id_set(key: &str, raw: &str) -> BTreeSet<String> {
    match serde_json::from_str(raw) {
        Ok(set) => set,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Ignoring malformed id set in app_state");
            BTreeSet::new()
        }
    }
}
