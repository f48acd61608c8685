/// Suggestion provider abstraction
///
/// This module provides a pluggable seam for external text-generation backends
/// consulted when the catalog search comes up empty. The returned text is
/// free-form prose: callers log it for analysis and never parse it into picks.
use crate::{error::AppResult, models::HistoryEntry};

#[cfg(test)]
use mockall::automock;

pub mod deepseek;

pub use deepseek::DeepSeekProvider;

/// Trait for suggestion backends
///
/// Implementations receive the already-built preference prompt plus the
/// caller's recent rating history for context, and return the backend's
/// free-text suggestions.
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait SuggestionProvider: Send + Sync {
    /// Ask the backend for suggestion text
    ///
    /// Errors cover transport failures and non-2xx upstream responses. Callers
    /// treat every error as "no suggestions" and fall through to their own
    /// fallbacks.
    async fn suggest(&self, prompt: &str, history: &[HistoryEntry]) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
