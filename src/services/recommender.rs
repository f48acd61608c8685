//! Catalog matching and the fallback cascade
//!
//! The strict match filters the catalog by the user's stated preferences and
//! excludes everything they have already reacted to. When that comes up empty
//! for a known user, the cascade kicks in: a best-effort external suggestion
//! call (logged, never parsed), then top-rated picks excluding seen content,
//! then top-rated picks over the whole catalog. The cascade returns something
//! whenever the catalog itself is non-empty.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::db::Store;
use crate::error::AppResult;
use crate::models::{Content, HistoryEntry, PreferenceTriple};
use crate::services::providers::SuggestionProvider;

/// Cap on the number of entries the cascade returns
const FALLBACK_LIMIT: u32 = 3;

/// History entries included in the suggestion prompt
const PROMPT_HISTORY_LIMIT: u32 = 5;

#[derive(Clone)]
pub struct Recommender {
    store: Arc<dyn Store>,
    suggester: Option<Arc<dyn SuggestionProvider>>,
    suggestion_timeout: Duration,
}

impl Recommender {
    pub fn new(
        store: Arc<dyn Store>,
        suggester: Option<Arc<dyn SuggestionProvider>>,
        suggestion_timeout: Duration,
    ) -> Self {
        Self {
            store,
            suggester,
            suggestion_timeout,
        }
    }

    /// Returns recommendations for the given preferences
    ///
    /// With a user id, content the user has already reacted to is excluded and
    /// the fallback cascade runs when the strict match is empty. Without one,
    /// the bare match result is returned as-is, possibly empty.
    pub async fn recommend(
        &self,
        prefs: &PreferenceTriple,
        user_id: Option<i64>,
    ) -> AppResult<Vec<Content>> {
        let exclude = match user_id {
            Some(id) => self.store.seen_content_ids(id).await?,
            None => Vec::new(),
        };

        let matches = self.store.search_catalog(prefs, &exclude).await?;
        if !matches.is_empty() {
            info!(
                results = matches.len(),
                excluded = exclude.len(),
                "Strict catalog match"
            );
            return Ok(matches);
        }

        let Some(user_id) = user_id else {
            return Ok(Vec::new());
        };

        self.consult_suggester(user_id, prefs).await;

        // Deterministic fallback: best of the unseen catalog, then best of
        // the whole catalog once the user has seen everything.
        let top = self.store.top_rated(&exclude, FALLBACK_LIMIT).await?;
        if !top.is_empty() {
            info!(user_id, results = top.len(), "Fallback to unseen top-rated");
            return Ok(top);
        }

        let top = self.store.top_rated(&[], FALLBACK_LIMIT).await?;
        info!(user_id, results = top.len(), "Fallback to full-catalog top-rated");
        Ok(top)
    }

    /// Best-effort external suggestion call
    ///
    /// The returned text is logged for analysis only. Timeouts, transport
    /// failures and upstream errors are logged and swallowed; the cascade's
    /// deterministic steps never wait on or fail with this call.
    async fn consult_suggester(&self, user_id: i64, prefs: &PreferenceTriple) {
        let Some(suggester) = &self.suggester else {
            return;
        };

        let history = match self.store.recent_history(user_id, PROMPT_HISTORY_LIMIT).await {
            Ok(history) => history,
            Err(e) => {
                warn!(user_id, error = %e, "History lookup for suggestion prompt failed");
                Vec::new()
            }
        };

        let prompt = build_suggestion_prompt(prefs, &history);
        let call = suggester.suggest(&prompt, &history);

        match tokio::time::timeout(self.suggestion_timeout, call).await {
            Ok(Ok(text)) => {
                info!(user_id, provider = suggester.name(), suggestions = %text, "External suggestions");
            }
            Ok(Err(e)) => {
                warn!(user_id, provider = suggester.name(), error = %e, "Suggestion call failed");
            }
            Err(_) => {
                warn!(
                    user_id,
                    provider = suggester.name(),
                    timeout_ms = self.suggestion_timeout.as_millis() as u64,
                    "Suggestion call timed out"
                );
            }
        }
    }
}

/// Renders the preference triple and recent ratings as a natural-language
/// request for the suggestion endpoint
pub fn build_suggestion_prompt(prefs: &PreferenceTriple, history: &[HistoryEntry]) -> String {
    let mut prompt = String::from("I am looking for a movie or anime to watch. ");

    if !prefs.genre.is_empty() {
        prompt.push_str(&format!("I like the {} genre. ", prefs.genre));
    }

    match prefs.depth.as_str() {
        "light" => prompt.push_str("I prefer light content. "),
        "medium" => prompt.push_str("I prefer content of medium depth. "),
        "deep" => prompt.push_str("I prefer deep content. "),
        _ => {}
    }

    if !prefs.features.is_empty() {
        prompt.push_str(&format!("Important elements: {}. ", prefs.features));
    }

    if !history.is_empty() {
        prompt.push_str("Previously I rated: ");
        for (i, entry) in history.iter().take(PROMPT_HISTORY_LIMIT as usize).enumerate() {
            if i > 0 {
                prompt.push_str(", ");
            }
            prompt.push_str(&format!("{} ({})", entry.title, entry.feedback.past_tense()));
        }
        prompt.push_str(". ");
    }

    prompt.push_str("Recommend 3 suitable movies or anime with titles and a short description of each.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockStore;
    use crate::error::AppError;
    use crate::models::{ContentKind, FeedbackKind};
    use crate::services::providers::MockSuggestionProvider;
    use chrono::Utc;

    fn content(id: i64, rating: f64) -> Content {
        Content {
            id,
            title: format!("Entry {}", id),
            genre: "sci-fi".to_string(),
            depth: "deep".to_string(),
            features: "action".to_string(),
            kind: ContentKind::Movie,
            description: "test".to_string(),
            rating,
            likes: 0,
            dislikes: 0,
            year: 2010,
        }
    }

    fn history_entry(title: &str, feedback: FeedbackKind) -> HistoryEntry {
        HistoryEntry {
            content_id: 1,
            title: title.to_string(),
            genre: "sci-fi".to_string(),
            kind: ContentKind::Movie,
            feedback,
            timestamp: Utc::now(),
        }
    }

    fn recommender(store: MockStore, suggester: Option<MockSuggestionProvider>) -> Recommender {
        Recommender::new(
            Arc::new(store),
            suggester.map(|s| Arc::new(s) as Arc<dyn SuggestionProvider>),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_strict_match_skips_fallback() {
        let mut store = MockStore::new();
        store
            .expect_seen_content_ids()
            .returning(|_| Ok(vec![2]));
        store
            .expect_search_catalog()
            .returning(|_, _| Ok(vec![content(1, 8.8)]));
        store.expect_top_rated().never();

        let results = recommender(store, None)
            .recommend(&PreferenceTriple::new("sci-fi", "", ""), Some(42))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, 1);
    }

    #[tokio::test]
    async fn test_no_user_id_returns_bare_match() {
        let mut store = MockStore::new();
        store.expect_seen_content_ids().never();
        store.expect_search_catalog().returning(|_, _| Ok(vec![]));
        store.expect_top_rated().never();

        let results = recommender(store, None)
            .recommend(&PreferenceTriple::new("western", "", ""), None)
            .await
            .unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_match_falls_back_to_unseen_top_rated() {
        let mut store = MockStore::new();
        store.expect_seen_content_ids().returning(|_| Ok(vec![1]));
        store.expect_search_catalog().returning(|_, _| Ok(vec![]));
        store
            .expect_top_rated()
            .withf(|exclude, limit| exclude == [1] && *limit == 3)
            .returning(|_, _| Ok(vec![content(2, 9.0), content(3, 8.5)]));

        let results = recommender(store, None)
            .recommend(&PreferenceTriple::new("western", "", ""), Some(42))
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, 2);
    }

    #[tokio::test]
    async fn test_all_seen_drops_exclusion() {
        let mut store = MockStore::new();
        store
            .expect_seen_content_ids()
            .returning(|_| Ok((1..=15).collect()));
        store.expect_search_catalog().returning(|_, _| Ok(vec![]));
        store
            .expect_top_rated()
            .withf(|exclude, _| !exclude.is_empty())
            .times(1)
            .returning(|_, _| Ok(vec![]));
        store
            .expect_top_rated()
            .withf(|exclude, _| exclude.is_empty())
            .times(1)
            .returning(|_, _| Ok(vec![content(3, 9.0), content(13, 9.0), content(11, 8.9)]));

        let results = recommender(store, None)
            .recommend(&PreferenceTriple::default(), Some(42))
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_suggester_failure_does_not_surface() {
        let mut store = MockStore::new();
        store.expect_seen_content_ids().returning(|_| Ok(vec![]));
        store.expect_search_catalog().returning(|_, _| Ok(vec![]));
        store.expect_recent_history().returning(|_, _| Ok(vec![]));
        store
            .expect_top_rated()
            .returning(|_, _| Ok(vec![content(1, 8.8)]));

        let mut suggester = MockSuggestionProvider::new();
        suggester
            .expect_suggest()
            .times(1)
            .returning(|_, _| Err(AppError::ExternalApi("status 500".to_string())));
        suggester.expect_name().return_const("mock");

        let results = recommender(store, Some(suggester))
            .recommend(&PreferenceTriple::new("western", "", ""), Some(42))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_suggester_is_timed_out() {
        struct SlowProvider;

        #[async_trait::async_trait]
        impl SuggestionProvider for SlowProvider {
            async fn suggest(&self, _: &str, _: &[HistoryEntry]) -> AppResult<String> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("too late".to_string())
            }

            fn name(&self) -> &'static str {
                "slow"
            }
        }

        let mut store = MockStore::new();
        store.expect_seen_content_ids().returning(|_| Ok(vec![]));
        store.expect_search_catalog().returning(|_, _| Ok(vec![]));
        store.expect_recent_history().returning(|_, _| Ok(vec![]));
        store
            .expect_top_rated()
            .returning(|_, _| Ok(vec![content(1, 8.8)]));

        let recommender = Recommender::new(
            Arc::new(store),
            Some(Arc::new(SlowProvider)),
            Duration::from_secs(5),
        );

        let results = recommender
            .recommend(&PreferenceTriple::new("western", "", ""), Some(42))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_prompt_mentions_every_stated_dimension() {
        let prefs = PreferenceTriple::new("sci-fi", "deep", "space");
        let prompt = build_suggestion_prompt(&prefs, &[]);

        assert!(prompt.contains("the sci-fi genre"));
        assert!(prompt.contains("deep content"));
        assert!(prompt.contains("Important elements: space."));
        assert!(prompt.contains("Recommend 3 suitable movies or anime"));
        assert!(!prompt.contains("Previously I rated"));
    }

    #[test]
    fn test_prompt_omits_empty_dimensions() {
        let prompt = build_suggestion_prompt(&PreferenceTriple::default(), &[]);

        assert!(!prompt.contains("genre."));
        assert!(!prompt.contains("content of medium depth"));
        assert!(!prompt.contains("Important elements"));
    }

    #[test]
    fn test_prompt_lists_at_most_five_ratings() {
        let history: Vec<HistoryEntry> = (0..7)
            .map(|i| history_entry(&format!("Title{}", i), FeedbackKind::Like))
            .collect();

        let prompt = build_suggestion_prompt(&PreferenceTriple::default(), &history);

        assert!(prompt.contains("Previously I rated: Title0 (liked)"));
        assert!(prompt.contains("Title4 (liked)"));
        assert!(!prompt.contains("Title5"));
    }
}
