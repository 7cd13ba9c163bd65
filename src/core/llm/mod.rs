//! Azure OpenAI chat completions.
//!
//! The freeform reply endpoint sends one user utterance per request under a
//! fixed scheduling instruction and speaks the first completion back.
//!
//! # API Reference
//!
//! - Endpoint: `POST {endpoint}/openai/deployments/{deployment}/chat/completions?api-version={version}`
//! - Auth: `api-key` header

mod client;
mod messages;

pub use client::{AzureOpenAIChat, ChatError, SCHEDULER_INSTRUCTION};
pub use messages::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ChatRole};
