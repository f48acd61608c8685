//! Feedback recording
//!
//! Thin facade over the store's transactional `record_feedback`: one feedback
//! event appends to the interaction log, bumps the user's interaction stats,
//! increments the matching counter and recomputes the rating, all inside one
//! transaction. Repeated reactions count every time; there is no dedup.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::db::Store;
use crate::error::AppResult;
use crate::models::FeedbackKind;

/// Updated tallies after a feedback event
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedbackOutcome {
    pub content_id: i64,
    pub likes: i64,
    pub dislikes: i64,
    pub rating: f64,
}

#[derive(Clone)]
pub struct FeedbackRecorder {
    store: Arc<dyn Store>,
}

impl FeedbackRecorder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Records one like/dislike; `NotFound` when the content id does not exist
    pub async fn record(
        &self,
        user_id: i64,
        content_id: i64,
        kind: FeedbackKind,
    ) -> AppResult<FeedbackOutcome> {
        let content = self.store.record_feedback(user_id, content_id, kind).await?;

        info!(
            user_id,
            content_id,
            kind = %kind,
            likes = content.likes,
            dislikes = content.dislikes,
            rating = content.rating,
            "Feedback recorded"
        );

        Ok(FeedbackOutcome {
            content_id: content.id,
            likes: content.likes,
            dislikes: content.dislikes,
            rating: content.rating,
        })
    }
}
