//! Tool-augmented query relay.
//!
//! The relay asks a tool-calling model whether the user's question needs a
//! file from the repository. When the model calls `fetch_file_source_code`
//! the file is fetched with the relay's own repository binding and
//! credential, appended as a tool result, and the model is asked again for a
//! final answer.
//!
//! States: `Idle -> AwaitingToolDecision -> (NoToolCall | ToolCallIssued)
//! -> ToolExecuted -> AwaitingFinalAnswer -> Complete`.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::auth::Credential;
use crate::error::{AppError, Result};
use crate::github::RepoRef;
use crate::llm::{ChatModel, ChatRequest, Message, ToolCall, ToolDefinition};

/// Name of the single tool offered to the model.
pub const FETCH_FILE_TOOL: &str = "fetch_file_source_code";

/// Output when the model answers without calling the tool.
pub const NO_TOOL_CALLS_MESSAGE: &str = "🚨 No tool calls found in the response.";

const MAX_TOKENS: u32 = 4096;

const SYSTEM_PROMPT: &str = "You are an AI assistant specialized in retrieving source code from a GitHub repository. \
Your task is to extract the file path from the user prompt and use the 'fetch_file_source_code' function \
to retrieve the file contents. If the prompt mentions a file name, assume it is located in the root directory.";

/// Where the relay reads files from.
#[async_trait]
pub trait FileSource: Send + Sync {
    async fn fetch_file(&self, path: &str, repo: &RepoRef, credential: &Credential)
        -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    AwaitingToolDecision,
    NoToolCall,
    ToolCallIssued,
    ToolExecuted,
    AwaitingFinalAnswer,
    Complete,
}

impl RelayState {
    const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::AwaitingToolDecision)
                | (Self::AwaitingToolDecision, Self::NoToolCall | Self::ToolCallIssued)
                | (Self::ToolCallIssued, Self::ToolExecuted)
                | (Self::ToolExecuted, Self::AwaitingFinalAnswer)
                | (Self::AwaitingFinalAnswer, Self::Complete)
        )
    }
}

/// What the relay produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Final answer from the second model call.
    Answer(String),
    /// The model did not call the tool.
    NoToolCall,
}

impl RelayOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Answer(text) => text,
            Self::NoToolCall => NO_TOOL_CALLS_MESSAGE,
        }
    }
}

/// A finished relay exchange.
#[derive(Debug, Clone)]
pub struct RelayRun {
    pub outcome: RelayOutcome,
    pub state: RelayState,
    /// Messages sent to the model, tool results included.
    pub messages: Vec<Message>,
}

fn fetch_file_tool() -> ToolDefinition {
    ToolDefinition::function(
        FETCH_FILE_TOOL,
        "Fetch the source code of a file in the GitHub repository",
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The path of the file to fetch"
                }
            },
            "required": ["file_path"]
        }),
    )
}

/// Runs the two-phase tool exchange against one repository.
pub struct ToolRelay<'a> {
    model: &'a dyn ChatModel,
    files: &'a dyn FileSource,
    model_name: String,
}

impl<'a> ToolRelay<'a> {
    pub fn new(model: &'a dyn ChatModel, files: &'a dyn FileSource, model_name: &str) -> Self {
        Self {
            model,
            files,
            model_name: model_name.to_string(),
        }
    }

    /// Answer `question` about `repo`, fetching a file when the model asks.
    ///
    /// Model errors propagate; fetch failures become tool-result text.
    pub async fn run(
        &self,
        question: &str,
        repo: &RepoRef,
        credential: &Credential,
    ) -> Result<RelayRun> {
        let mut state = RelayState::Idle;
        let mut messages = vec![Message::system(SYSTEM_PROMPT), Message::user(question)];

        let request = ChatRequest {
            tools: Some(vec![fetch_file_tool()]),
            tool_choice: Some("auto".to_string()),
            max_tokens: Some(MAX_TOKENS),
            ..ChatRequest::new(&self.model_name, messages.clone())
        };
        advance(&mut state, RelayState::AwaitingToolDecision);
        let decision = self.model.complete(&request).await?;

        if decision.tool_calls.is_empty() {
            advance(&mut state, RelayState::NoToolCall);
            return Ok(RelayRun {
                outcome: RelayOutcome::NoToolCall,
                state,
                messages,
            });
        }

        advance(&mut state, RelayState::ToolCallIssued);
        messages.push(decision.to_message());
        for call in &decision.tool_calls {
            let content = self.execute(call, repo, credential).await;
            messages.push(Message::tool_result(call, content));
        }
        advance(&mut state, RelayState::ToolExecuted);

        let follow_up = ChatRequest::new(&self.model_name, messages.clone());
        advance(&mut state, RelayState::AwaitingFinalAnswer);
        let answer = self.model.complete(&follow_up).await?;
        advance(&mut state, RelayState::Complete);

        Ok(RelayRun {
            outcome: RelayOutcome::Answer(answer.content.unwrap_or_default()),
            state,
            messages,
        })
    }

    /// Run one tool call. Owner, repository and credential come from the
    /// relay, never from the model's arguments.
    async fn execute(&self, call: &ToolCall, repo: &RepoRef, credential: &Credential) -> String {
        if call.function.name != FETCH_FILE_TOOL {
            tracing::warn!(tool = %call.function.name, "model requested unknown tool");
            return format!("Unknown tool: {}", call.function.name);
        }

        let args: Value = match serde_json::from_str(&call.function.arguments) {
            Ok(args) => args,
            Err(e) => return format!("Invalid arguments for {FETCH_FILE_TOOL}: {e}"),
        };
        let Some(file_path) = args.get("file_path").and_then(Value::as_str) else {
            return format!("Missing required argument 'file_path' for {FETCH_FILE_TOOL}");
        };

        tracing::info!(%repo, file_path, call_id = %call.id, "executing tool call");
        match self.files.fetch_file(file_path, repo, credential).await {
            Ok(content) => content,
            Err(err @ AppError::Fetch { .. }) => err.to_string(),
            Err(err) => format!("Failed to fetch file: {err}"),
        }
    }
}

fn advance(state: &mut RelayState, next: RelayState) {
    debug_assert!(
        state.can_advance_to(next),
        "invalid relay transition {state:?} -> {next:?}"
    );
    tracing::debug!(from = ?state, to = ?next, "relay transition");
    *state = next;
}
