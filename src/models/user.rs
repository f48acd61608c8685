use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::content::ContentKind;

/// The three stated preference dimensions collected by the dialog
///
/// An empty string on any dimension means "match anything" there: genre and
/// features filter by substring against the comma-joined tag columns, depth
/// by exact match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreferenceTriple {
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub depth: String,
    #[serde(default)]
    pub features: String,
}

impl PreferenceTriple {
    pub fn new(genre: impl Into<String>, depth: impl Into<String>, features: impl Into<String>) -> Self {
        Self {
            genre: genre.into(),
            depth: depth.into(),
            features: features.into(),
        }
    }

    /// True when every dimension is a wildcard
    pub fn is_unconstrained(&self) -> bool {
        self.genre.is_empty() && self.depth.is_empty() && self.features.is_empty()
    }
}

/// A user's binary reaction to a shown recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Like,
    Dislike,
}

impl FeedbackKind {
    /// Stable string form used in the `user_interactions.interaction_type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Like => "like",
            FeedbackKind::Dislike => "dislike",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "like" => Some(FeedbackKind::Like),
            "dislike" => Some(FeedbackKind::Dislike),
            _ => None,
        }
    }

    /// Past-tense form used when rendering history into prompt text
    pub fn past_tense(&self) -> &'static str {
        match self {
            FeedbackKind::Like => "liked",
            FeedbackKind::Dislike => "disliked",
        }
    }
}

impl std::fmt::Display for FeedbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Persisted per-user state: latest stated preferences plus interaction stats
///
/// Created on first interaction, mutated on every preference submission and
/// every feedback event, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub user_id: i64,
    pub preferences: PreferenceTriple,
    pub interaction_count: i64,
    pub last_interaction: Option<DateTime<Utc>>,
}

/// One row of the derived history view (interaction log joined with content)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub content_id: i64,
    pub title: String,
    pub genre: String,
    pub kind: ContentKind,
    pub feedback: FeedbackKind,
    pub timestamp: DateTime<Utc>,
}
