//! Language-model access.

mod groq;
mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use groq::{ApiKey, GroqClient};
pub use types::{AssistantReply, ChatRequest, Message, ToolCall, ToolDefinition};

/// A chat-completions backend.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one request and return the first choice's assistant message.
    async fn complete(&self, request: &ChatRequest) -> Result<AssistantReply>;
}
