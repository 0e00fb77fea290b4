//! Chat-completion client used by the research pipeline and MVTA analysis.

mod client;
mod types;

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;

pub use client::LlmClient;
pub use types::{
    ChatCompletionResponse, ChatRequest, ChatResponse, Choice, ChoiceMessage, Message,
    MessageRole, ResponseFormat, TokenUsage,
};
