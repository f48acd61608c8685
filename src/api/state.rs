use std::sync::Arc;
use std::time::Duration;

use crate::db::Store;
use crate::services::providers::SuggestionProvider;
use crate::services::{DialogEngine, FeedbackRecorder, Recommender, SessionStore};

/// Shared application state handed to every handler
///
/// Everything inside is cheaply cloneable; the store and the optional
/// suggestion provider are shared behind Arcs.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub recommender: Recommender,
    pub feedback: FeedbackRecorder,
    pub dialog: DialogEngine,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        suggester: Option<Arc<dyn SuggestionProvider>>,
        sessions: SessionStore,
        suggestion_timeout: Duration,
    ) -> Self {
        let recommender = Recommender::new(store.clone(), suggester, suggestion_timeout);
        let feedback = FeedbackRecorder::new(store.clone());
        let dialog = DialogEngine::new(
            sessions,
            store.clone(),
            recommender.clone(),
            feedback.clone(),
        );

        Self {
            store,
            recommender,
            feedback,
            dialog,
        }
    }
}
