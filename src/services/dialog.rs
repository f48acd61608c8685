//! The four-step recommendation dialog
//!
//! Idle → genre → depth → features → feedback → idle, forward-only. Choosing
//! a feature persists the collected triple, runs the recommender and shows
//! the first candidate; the like/dislike answer goes through the feedback
//! recorder and ends the dialog. Choices are validated against the option
//! list of the current step.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::db::Store;
use crate::error::{AppError, AppResult};
use crate::models::{Content, FeedbackKind};
use crate::services::feedback::FeedbackRecorder;
use crate::services::recommender::Recommender;
use crate::services::session::{DialogSession, DialogState, SessionStore};

pub const GENRE_OPTIONS: &[&str] = &[
    "comedy",
    "drama",
    "sci-fi",
    "action",
    "thriller",
    "horror",
    "romance",
    "fantasy",
    "adventure",
];

pub const DEPTH_OPTIONS: &[&str] = &["light", "medium", "deep"];

pub const FEATURE_OPTIONS: &[&str] = &[
    "action",
    "romance",
    "humor",
    "drama",
    "mystery",
    "science",
];

pub const FEEDBACK_OPTIONS: &[&str] = &["like", "dislike"];

/// Which step the reply belongs to
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DialogStage {
    Genre,
    Depth,
    Features,
    Feedback,
    Done,
}

/// A shown recommendation: the catalog row plus its rendered card
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationCard {
    pub content: Content,
    pub text: String,
}

/// What the dialog says back after each step
#[derive(Debug, Clone, Serialize)]
pub struct DialogReply {
    pub stage: DialogStage,
    pub prompt: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<RecommendationCard>,
    pub done: bool,
}

impl DialogReply {
    fn step(stage: DialogStage, prompt: &str, options: &[&str]) -> Self {
        Self {
            stage,
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            recommendation: None,
            done: false,
        }
    }

    fn closing(prompt: &str) -> Self {
        Self {
            stage: DialogStage::Done,
            prompt: prompt.to_string(),
            options: Vec::new(),
            recommendation: None,
            done: true,
        }
    }
}

#[derive(Clone)]
pub struct DialogEngine {
    sessions: SessionStore,
    store: Arc<dyn Store>,
    recommender: Recommender,
    feedback: FeedbackRecorder,
}

impl DialogEngine {
    pub fn new(
        sessions: SessionStore,
        store: Arc<dyn Store>,
        recommender: Recommender,
        feedback: FeedbackRecorder,
    ) -> Self {
        Self {
            sessions,
            store,
            recommender,
            feedback,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Opens a fresh dialog for the user, replacing any in-flight one
    pub async fn start(&self, user_id: i64) -> DialogReply {
        self.sessions.begin(user_id).await;
        info!(user_id, "Dialog started");
        DialogReply::step(
            DialogStage::Genre,
            "Great! Which genre do you like most?",
            GENRE_OPTIONS,
        )
    }

    /// Advances the dialog one step with the user's choice
    ///
    /// `Session` when the user has no live dialog, `InvalidInput` when the
    /// choice is not among the current step's options (the session survives
    /// an invalid choice).
    pub async fn choose(&self, user_id: i64, choice: &str) -> AppResult<DialogReply> {
        let session = self.sessions.take(user_id).await.ok_or_else(|| {
            AppError::Session(format!(
                "no active dialog for user {}; start one first",
                user_id
            ))
        })?;

        match session.state.clone() {
            DialogState::AwaitingGenre => {
                let mut session = self.validated(user_id, session, choice, GENRE_OPTIONS).await?;
                session.prefs.genre = choice.to_string();
                session.state = DialogState::AwaitingDepth;
                self.sessions.put(user_id, session).await;
                Ok(DialogReply::step(
                    DialogStage::Depth,
                    "Do you want something light, or something with deeper meaning?",
                    DEPTH_OPTIONS,
                ))
            }
            DialogState::AwaitingDepth => {
                let mut session = self.validated(user_id, session, choice, DEPTH_OPTIONS).await?;
                session.prefs.depth = choice.to_string();
                session.state = DialogState::AwaitingFeatures;
                self.sessions.put(user_id, session).await;
                Ok(DialogReply::step(
                    DialogStage::Features,
                    "Which elements matter most to you?",
                    FEATURE_OPTIONS,
                ))
            }
            DialogState::AwaitingFeatures => {
                let mut session = self
                    .validated(user_id, session, choice, FEATURE_OPTIONS)
                    .await?;
                session.prefs.features = choice.to_string();

                self.store.save_preferences(user_id, &session.prefs).await?;
                let results = self.recommender.recommend(&session.prefs, Some(user_id)).await?;

                match results.into_iter().next() {
                    Some(content) => {
                        info!(user_id, content_id = content.id, "Recommendation shown");
                        session.state = DialogState::AwaitingFeedback {
                            content_id: content.id,
                        };
                        self.sessions.put(user_id, session).await;

                        let text = render_card(&content);
                        Ok(DialogReply {
                            stage: DialogStage::Feedback,
                            prompt: "How do you like this recommendation?".to_string(),
                            options: FEEDBACK_OPTIONS.iter().map(|o| o.to_string()).collect(),
                            recommendation: Some(RecommendationCard { content, text }),
                            done: false,
                        })
                    }
                    None => {
                        // Only reachable with an empty catalog; the dialog
                        // ends rather than waiting for feedback on nothing.
                        info!(user_id, "No recommendation available, dialog closed");
                        Ok(DialogReply::closing(
                            "Sorry, there is nothing to recommend right now. Try again later.",
                        ))
                    }
                }
            }
            DialogState::AwaitingFeedback { content_id } => {
                let kind = match FeedbackKind::from_db(choice) {
                    Some(kind) => kind,
                    None => {
                        self.sessions.put(user_id, session).await;
                        return Err(AppError::InvalidInput(format!(
                            "'{}' is not a valid choice here; options: like, dislike",
                            choice
                        )));
                    }
                };

                self.feedback.record(user_id, content_id, kind).await?;
                Ok(DialogReply::closing(
                    "Thanks! Your feedback is saved and will sharpen future recommendations.",
                ))
            }
        }
    }

    /// Checks the choice against the step's options, restoring the session
    /// before reporting an invalid one
    async fn validated(
        &self,
        user_id: i64,
        session: DialogSession,
        choice: &str,
        options: &[&str],
    ) -> AppResult<DialogSession> {
        if options.contains(&choice) {
            return Ok(session);
        }
        self.sessions.put(user_id, session).await;
        Err(AppError::InvalidInput(format!(
            "'{}' is not a valid choice here; options: {}",
            choice,
            options.join(", ")
        )))
    }
}

/// Renders the recommendation card shown to the user
fn render_card(content: &Content) -> String {
    let genres = join_capitalized(content.genre_tags());
    let features = join_capitalized(content.feature_tags());

    format!(
        "{} ({}, {})\nGenre: {}\nFeatures: {}\nDepth: {}\n\n{}",
        content.title,
        content.kind,
        content.year,
        genres,
        features,
        capitalize(&content.depth),
        content.description,
    )
}

fn join_capitalized(tags: Vec<&str>) -> String {
    tags.iter()
        .map(|t| capitalize(t))
        .collect::<Vec<_>>()
        .join(", ")
}

fn capitalize(tag: &str) -> String {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::seed::seed_catalog;
    use crate::db::{create_pool, SqliteStore};
    use std::time::Duration;

    async fn engine_with_catalog(seeded: bool) -> DialogEngine {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let store = SqliteStore::new(pool.clone());
        store.migrate().await.unwrap();
        if seeded {
            seed_catalog(&pool).await.unwrap();
        }

        let store: Arc<dyn Store> = Arc::new(store);
        let sessions = SessionStore::new(Duration::from_secs(1800));
        let recommender = Recommender::new(store.clone(), None, Duration::from_secs(1));
        let feedback = FeedbackRecorder::new(store.clone());
        DialogEngine::new(sessions, store, recommender, feedback)
    }

    #[tokio::test]
    async fn test_full_dialog_flow() {
        let engine = engine_with_catalog(true).await;

        let reply = engine.start(42).await;
        assert_eq!(reply.stage, DialogStage::Genre);
        assert_eq!(reply.options.len(), 9);

        let reply = engine.choose(42, "sci-fi").await.unwrap();
        assert_eq!(reply.stage, DialogStage::Depth);
        assert_eq!(reply.options, vec!["light", "medium", "deep"]);

        let reply = engine.choose(42, "deep").await.unwrap();
        assert_eq!(reply.stage, DialogStage::Features);

        let reply = engine.choose(42, "science").await.unwrap();
        assert_eq!(reply.stage, DialogStage::Feedback);
        let card = reply.recommendation.unwrap();
        assert_eq!(card.content.title, "Интерстеллар");
        assert!(card.text.contains("Интерстеллар"));
        assert!(card.text.contains("Depth: Deep"));

        let reply = engine.choose(42, "like").await.unwrap();
        assert_eq!(reply.stage, DialogStage::Done);
        assert!(reply.done);

        // Session is gone once the dialog completed.
        let err = engine.choose(42, "like").await.unwrap_err();
        assert!(matches!(err, AppError::Session(_)));

        // Preference submission and feedback both counted.
        let profile = engine.store.user_profile(42).await.unwrap().unwrap();
        assert_eq!(profile.interaction_count, 2);
        assert_eq!(profile.preferences.genre, "sci-fi");
    }

    #[tokio::test]
    async fn test_invalid_choice_keeps_session() {
        let engine = engine_with_catalog(true).await;
        engine.start(42).await;

        let err = engine.choose(42, "western").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        // The dialog is still at the genre step.
        let reply = engine.choose(42, "comedy").await.unwrap();
        assert_eq!(reply.stage, DialogStage::Depth);
    }

    #[tokio::test]
    async fn test_choose_without_session_is_rejected() {
        let engine = engine_with_catalog(true).await;
        let err = engine.choose(42, "comedy").await.unwrap_err();
        assert!(matches!(err, AppError::Session(_)));
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let engine = engine_with_catalog(true).await;
        engine.start(42).await;

        // Pause only after setup: auto-advancing the paused clock while
        // sqlx connects in a blocking task trips the pool acquire timeout.
        tokio::time::pause();
        tokio::time::advance(Duration::from_secs(1801)).await;

        let err = engine.choose(42, "comedy").await.unwrap_err();
        assert!(matches!(err, AppError::Session(_)));
    }

    #[tokio::test]
    async fn test_empty_catalog_ends_dialog_apologetically() {
        let engine = engine_with_catalog(false).await;
        engine.start(42).await;

        engine.choose(42, "sci-fi").await.unwrap();
        engine.choose(42, "deep").await.unwrap();
        let reply = engine.choose(42, "science").await.unwrap();

        assert_eq!(reply.stage, DialogStage::Done);
        assert!(reply.done);
        assert!(reply.recommendation.is_none());
    }

    #[tokio::test]
    async fn test_feedback_step_rejects_non_feedback_choice() {
        let engine = engine_with_catalog(true).await;
        engine.start(42).await;
        engine.choose(42, "sci-fi").await.unwrap();
        engine.choose(42, "deep").await.unwrap();
        engine.choose(42, "science").await.unwrap();

        let err = engine.choose(42, "maybe").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        // Still awaiting feedback.
        let reply = engine.choose(42, "dislike").await.unwrap();
        assert!(reply.done);
    }

    #[test]
    fn test_render_card_capitalizes_tags() {
        let content = Content {
            id: 6,
            title: "Интерстеллар".to_string(),
            genre: "sci-fi,drama".to_string(),
            depth: "deep".to_string(),
            features: "space,science".to_string(),
            kind: crate::models::ContentKind::Movie,
            description: "desc".to_string(),
            rating: 8.6,
            likes: 0,
            dislikes: 0,
            year: 2014,
        };

        let text = render_card(&content);
        assert!(text.starts_with("Интерстеллар (Movie, 2014)"));
        assert!(text.contains("Genre: Sci-fi, Drama"));
        assert!(text.contains("Features: Space, Science"));
        assert!(text.contains("Depth: Deep"));
    }
}
