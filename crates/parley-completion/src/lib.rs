//! Completion client for the hosted language-model endpoint.
//!
//! Builds single-turn chat-completion requests, enforces the request
//! timeout, and reports the outcome as a tagged [`Completion`].

pub mod client;
pub mod error;
pub mod mock;
pub mod types;

pub use client::{AzureCompletionClient, CompletionClient};
pub use error::CompletionError;
pub use mock::MockCompletion;
pub use types::{ChatMessage, Completion, CompletionRequest, CompletionResponse};
