/// DeepSeek chat-completions provider
///
/// Speaks the OpenAI-style chat API: a system role line, an optional system
/// block carrying the user's recent ratings, and the preference prompt as the
/// user message. The first choice's message content is the suggestion text.
use crate::{
    error::{AppError, AppResult},
    models::HistoryEntry,
    services::providers::SuggestionProvider,
};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

const SYSTEM_ROLE: &str =
    "You are an expert on movies and anime who helps users find content matching their tastes.";

#[derive(Clone)]
pub struct DeepSeekProvider {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl DeepSeekProvider {
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            api_key,
            model,
        }
    }

    fn build_messages(&self, prompt: &str, history: &[HistoryEntry]) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage {
            role: "system",
            content: SYSTEM_ROLE.to_string(),
        }];

        if !history.is_empty() {
            let mut context = String::from("The user's recent ratings:\n");
            for entry in history {
                context.push_str(&format!(
                    "- {} ({}): {}\n",
                    entry.title,
                    entry.kind,
                    entry.feedback.past_tense()
                ));
            }
            messages.push(ChatMessage {
                role: "system",
                content: context,
            });
        }

        messages.push(ChatMessage {
            role: "user",
            content: prompt.to_string(),
        });

        messages
    }
}

#[async_trait::async_trait]
impl SuggestionProvider for DeepSeekProvider {
    async fn suggest(&self, prompt: &str, history: &[HistoryEntry]) -> AppResult<String> {
        let messages = self.build_messages(prompt, history);
        let request = ChatRequest {
            model: &self.model,
            messages: &messages,
            temperature: 0.7,
            max_tokens: 500,
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Suggestion API returned status {}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response.json().await?;
        let text = chat
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                AppError::ExternalApi("Suggestion API response held no choices".to_string())
            })?;

        tracing::info!(
            chars = text.len(),
            provider = self.name(),
            "Suggestion text received"
        );

        Ok(text)
    }

    fn name(&self) -> &'static str {
        "deepseek"
    }
}
