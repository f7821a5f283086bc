//! Completer trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything the completion collaborator needs for one turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Fixed system instruction
    pub system_instruction: String,
    /// Serialized search results and auxiliary payload
    pub context_block: String,
    /// Raw user query
    pub user_query: String,
    /// Optional output cap
    pub max_output_tokens: Option<u32>,
}

impl CompletionRequest {
    /// The user-role prompt: context first, then the query
    pub fn user_prompt(&self) -> String {
        format!("Context: {}\n\nQuery: {}", self.context_block, self.user_query)
    }
}

/// Failure of a completion request
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("malformed completion response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("completion response contained no text")]
    Empty,
}

/// Completion collaborator: turns a prompt into reply text
#[async_trait]
pub trait Completer: Send + Sync {
    /// Completer name for logs
    fn name(&self) -> &str;

    /// Generate a reply
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}
