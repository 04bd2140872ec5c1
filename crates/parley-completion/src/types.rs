//! Wire types for the chat-completions endpoint.

use serde::{Deserialize, Serialize};

use parley_core::config::CompletionConfig;

/// Outcome of a successful round trip to the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Text of the first choice. May be empty: a zero-length answer is
    /// still an answer.
    Answer(String),
    /// The endpoint replied 2xx but offered no choices.
    Empty,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String, // "system" | "user" | "assistant"
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body sent to the endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Single-turn request carrying `question` as the user message.
    pub fn single_turn(question: &str, config: &CompletionConfig) -> Self {
        Self {
            messages: vec![ChatMessage::user(question)],
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
        }
    }
}

/// Response body returned by the endpoint. Every level is optional so
/// partial bodies still parse.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionResponse {
    /// Extract the first choice's content verbatim.
    pub fn into_completion(self) -> Completion {
        match self.choices.and_then(|c| c.into_iter().next()) {
            Some(choice) => Completion::Answer(
                choice
                    .message
                    .and_then(|m| m.content)
                    .unwrap_or_default(),
            ),
            None => Completion::Empty,
        }
    }
}
