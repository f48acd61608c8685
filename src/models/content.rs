use serde::{Deserialize, Serialize};

/// Whether a catalog entry is a movie or an anime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Anime,
}

impl ContentKind {
    /// Stable string form used in the `content.type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::Anime => "anime",
        }
    }

    /// Maps a stored `type` value onto the enum; unknown values fall back to Movie
    pub fn from_db(value: &str) -> Self {
        match value {
            "anime" => ContentKind::Anime,
            _ => ContentKind::Movie,
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ContentKind::Movie => "Movie",
            ContentKind::Anime => "Anime",
        };
        write!(f, "{}", label)
    }
}

/// A single catalog entry
///
/// Descriptive fields are fixed at catalog load time; `likes`, `dislikes` and
/// `rating` are mutated only through the feedback recorder. Genre and feature
/// tags are stored comma-joined, exactly as the catalog seeds them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub id: i64,
    pub title: String,
    /// Comma-joined genre tags, e.g. "sci-fi,thriller"
    pub genre: String,
    /// Tonal weight tag: "light", "medium" or "deep"
    pub depth: String,
    /// Comma-joined feature tags, e.g. "action,mystery"
    pub features: String,
    pub kind: ContentKind,
    pub description: String,
    /// 0-10 scale; recomputed as 10 * likes / (likes + dislikes) once votes exist
    pub rating: f64,
    pub likes: i64,
    pub dislikes: i64,
    pub year: i32,
}

impl Content {
    /// Genre tags split out of the comma-joined column
    pub fn genre_tags(&self) -> Vec<&str> {
        split_tags(&self.genre)
    }

    /// Feature tags split out of the comma-joined column
    pub fn feature_tags(&self) -> Vec<&str> {
        split_tags(&self.features)
    }
}

fn split_tags(joined: &str) -> Vec<&str> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}
