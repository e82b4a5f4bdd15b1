//! Conversation state: one ordered log with a full-transcript view and a
//! windowed replay view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::Message;

/// Number of recent turns replayed into model prompts.
pub const DEFAULT_WINDOW: usize = 5;

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the assistant.
    Assistant,
}

impl MessageRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rendered chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: String) -> Self {
        Self {
            role,
            content,
            created_at: Utc::now(),
        }
    }
}

/// A question and the answer it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub human: String,
    pub assistant: String,
}

impl ConversationTurn {
    pub fn new(human: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            human: human.into(),
            assistant: assistant.into(),
        }
    }
}

/// Append-only conversation log.
///
/// Messages are stored as user/assistant pairs, so turn `n` is always
/// `messages[2n..2n + 2]`.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    messages: Vec<ChatMessage>,
    window: usize,
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::with_window(DEFAULT_WINDOW)
    }
}

impl ConversationLog {
    pub const fn with_window(window: usize) -> Self {
        Self {
            messages: Vec::new(),
            window,
        }
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        self.messages
            .push(ChatMessage::new(MessageRole::User, turn.human));
        self.messages
            .push(ChatMessage::new(MessageRole::Assistant, turn.assistant));
    }

    /// Every message in insertion order.
    pub fn transcript(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn turn_count(&self) -> usize {
        self.messages.len() / 2
    }

    /// The most recent turns, oldest first, at most `window` of them.
    pub fn window(&self) -> Vec<ConversationTurn> {
        let skip = self.turn_count().saturating_sub(self.window);
        self.messages
            .chunks_exact(2)
            .skip(skip)
            .map(|pair| ConversationTurn::new(pair[0].content.clone(), pair[1].content.clone()))
            .collect()
    }

    /// Append the windowed turns to `prompt` as user/assistant messages.
    pub fn replay_into(&self, prompt: &mut Vec<Message>) {
        for turn in self.window() {
            prompt.push(Message::user(turn.human));
            prompt.push(Message::assistant(turn.assistant));
        }
    }
}
