//! Retriever trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A document returned by the search collaborator.
///
/// The shape is owned by the search index; the relay only serializes it
/// into the context block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(pub serde_json::Value);

impl From<serde_json::Value> for Document {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

/// Failure of a search request
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search service returned HTTP {status}: {body}")]
    Http {
        status: u16,
        body: String,
        /// Rate limited or server-side; a later attempt could succeed
        transient: bool,
    },

    #[error("malformed search response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("search is not configured: {0}")]
    NotConfigured(String),
}

impl RetrievalError {
    /// Whether a later attempt could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            RetrievalError::Transport(_) => true,
            RetrievalError::Http { transient, .. } => *transient,
            RetrievalError::Malformed(_) | RetrievalError::NotConfigured(_) => false,
        }
    }
}

/// Search collaborator: returns at most `top` documents for a query, in rank order
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Retriever name for logs
    fn name(&self) -> &str;

    /// Search the index
    async fn search(&self, query: &str, top: usize) -> Result<Vec<Document>, RetrievalError>;
}
