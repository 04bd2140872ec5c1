//! Scripted completion client for tests and offline runs.

use std::sync::Mutex;

use crate::client::CompletionClient;
use crate::error::CompletionError;
use crate::types::Completion;

/// Returns the same scripted outcome for every question and records the
/// questions it was asked.
pub struct MockCompletion {
    outcome: Result<Completion, CompletionError>,
    asked: Mutex<Vec<String>>,
}

impl MockCompletion {
    pub fn new(outcome: Result<Completion, CompletionError>) -> Self {
        Self {
            outcome,
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `text`.
    pub fn answer(text: &str) -> Self {
        Self::new(Ok(Completion::Answer(text.to_string())))
    }

    /// Always reply with no choices.
    pub fn empty() -> Self {
        Self::new(Ok(Completion::Empty))
    }

    /// Always fail with `err`.
    pub fn failing(err: CompletionError) -> Self {
        Self::new(Err(err))
    }

    /// Questions received so far, oldest first.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl CompletionClient for MockCompletion {
    async fn complete(&self, question: &str) -> Result<Completion, CompletionError> {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.to_string());
        }
        self.outcome.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_questions() {
        let mock = MockCompletion::answer("hi");
        assert_eq!(
            mock.complete("one").await.unwrap(),
            Completion::Answer("hi".to_string())
        );
        mock.complete("two").await.unwrap();
        assert_eq!(mock.asked(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_mock_failure() {
        let mock = MockCompletion::failing(CompletionError::Timeout(30));
        assert_eq!(
            mock.complete("q").await.unwrap_err(),
            CompletionError::Timeout(30)
        );
    }
}
