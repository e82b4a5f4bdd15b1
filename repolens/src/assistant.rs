//! Repository assistant: one chat turn about the session's repository.

use crate::conversation::ConversationTurn;
use crate::error::{AppError, Result};
use crate::github::RepoRef;
use crate::llm::{ChatModel, ChatRequest, Message};
use crate::relay::{FileSource, ToolRelay};
use crate::session::Session;

fn repository_prompt(repo: &RepoRef, structure: &str) -> String {
    format!(
        "You are an AI assistant specialized in answering questions and providing insights about \
         GitHub repository '{}' owned by '{}'. The structure of the repository is as follows: \
         '{structure}'. Your role is to help users understand and navigate the codebase, offering \
         explanations and insights about files, directories, and code within the repository.",
        repo.name, repo.owner
    )
}

fn enhanced_prompt(question: &str, source: &str) -> String {
    format!("Prompt: {question}\n\nSource Code/Brief fetched using another AI:\n{source}")
}

/// Answers questions using the tool relay plus the session's chosen model.
pub struct RepoAssistant<'a> {
    model: &'a dyn ChatModel,
    relay: ToolRelay<'a>,
}

impl<'a> RepoAssistant<'a> {
    /// `tool_model` drives the relay; the final answer uses the session's model.
    pub fn new(model: &'a dyn ChatModel, files: &'a dyn FileSource, tool_model: &str) -> Self {
        Self {
            model,
            relay: ToolRelay::new(model, files, tool_model),
        }
    }

    /// Answer `question` and record the turn in the session's conversation.
    pub async fn ask(&self, session: &mut Session, question: &str) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::EmptyQuestion);
        }
        let credential = session.credential()?.clone();
        let repo = session.repo()?.clone();

        let run = self.relay.run(question, &repo, &credential).await?;
        tracing::debug!(
            session = %session.id,
            state = ?run.state,
            messages = run.messages.len(),
            "relay finished"
        );

        let mut messages = vec![Message::system(repository_prompt(&repo, session.structure()))];
        session.conversation().replay_into(&mut messages);
        messages.push(Message::user(enhanced_prompt(question, run.outcome.text())));

        let reply = self
            .model
            .complete(&ChatRequest::new(session.model(), messages))
            .await?;
        let answer = reply.content.unwrap_or_default();

        session
            .conversation_mut()
            .append(ConversationTurn::new(question, answer.clone()));
        tracing::info!(
            session = %session.id,
            turns = session.conversation().turn_count(),
            "answered question"
        );
        Ok(answer)
    }
}
