use std::collections::BTreeSet;

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of sift appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Triage Sets
// ============================================================================

/// The two persisted id sets that drive feed filtering.
///
/// Sets are independent: a story can be read, saved, both, or neither.
/// `BTreeSet` keeps membership checks cheap and serialization deterministic
/// (ids come out sorted, so the stored JSON is stable across runs).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriageSets {
    pub read: BTreeSet<String>,
    pub saved: BTreeSet<String>,
}

impl TriageSets {
    pub fn is_read(&self, id: &str) -> bool {
        self.read.contains(id)
    }

    pub fn is_saved(&self, id: &str) -> bool {
        self.saved.contains(id)
    }
}
