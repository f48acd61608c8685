use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::error::AppResult;
use crate::models::{Content, FeedbackKind, HistoryEntry, PreferenceTriple, UserProfile};

pub mod seed;
pub mod sqlite;

pub use sqlite::create_pool;
pub use sqlite::SqliteStore;

/// Repository over the user and content relations
///
/// Everything above the storage layer talks to this trait, so services can be
/// unit-tested against a mock and the SQL stays in one place. The one
/// multi-statement operation, `record_feedback`, is transactional inside the
/// implementation; callers never see a half-applied feedback event.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Full catalog, id ascending
    async fn catalog(&self) -> AppResult<Vec<Content>>;

    /// Single catalog entry; `NotFound` when the id does not exist
    async fn content_by_id(&self, id: i64) -> AppResult<Content>;

    /// Strict preference match, rating descending with id-ascending tiebreak
    ///
    /// Empty preference fields match anything on that dimension. Genre and
    /// features filter by substring against the comma-joined tag columns,
    /// depth by exact match. Always returns a (possibly empty) ordered list.
    async fn search_catalog(
        &self,
        prefs: &PreferenceTriple,
        exclude: &[i64],
    ) -> AppResult<Vec<Content>>;

    /// Top-rated entries in rating-then-random order, capped at `limit`
    async fn top_rated(&self, exclude: &[i64], limit: u32) -> AppResult<Vec<Content>>;

    /// Stored profile for a user, `None` when the user has never interacted
    async fn user_profile(&self, user_id: i64) -> AppResult<Option<UserProfile>>;

    /// Upserts the user's stated preferences and bumps the interaction stats
    async fn save_preferences(&self, user_id: i64, prefs: &PreferenceTriple) -> AppResult<()>;

    /// Distinct content ids the user has ever reacted to
    async fn seen_content_ids(&self, user_id: i64) -> AppResult<Vec<i64>>;

    /// Derived history view (interaction log joined with content), newest first
    async fn recent_history(&self, user_id: i64, limit: u32) -> AppResult<Vec<HistoryEntry>>;

    /// Applies one feedback event as a single atomic unit and returns the
    /// updated content row
    ///
    /// Creates the user row on first contact, appends to the interaction log,
    /// increments the matching counter and recomputes the rating. `NotFound`
    /// when the content id does not exist; nothing is written in that case.
    async fn record_feedback(
        &self,
        user_id: i64,
        content_id: i64,
        kind: FeedbackKind,
    ) -> AppResult<Content>;
}
