mod content;
mod user;

pub use content::{Content, ContentKind};
pub use user::{FeedbackKind, HistoryEntry, PreferenceTriple, UserProfile};
