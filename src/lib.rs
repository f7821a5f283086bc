//! RAG-Relay: a chat bot that answers with retrieval-augmented generation
//!
//! Each Bot Framework message is relayed to a search index, the results are
//! forwarded with the query to a chat-completion model, and the generated
//! text is sent back to the conversation.

pub mod bot;
pub mod completion;
pub mod config;
pub mod metrics;
pub mod network;
pub mod orchestrator;
pub mod retrieval;
pub mod web;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Settings;
pub use orchestrator::{Orchestrator, TurnPolicy};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default number of documents requested from search
pub const DEFAULT_TOP: usize = 5;

/// Default overall deadline for one turn, in seconds
pub const DEFAULT_DEADLINE_SECS: f64 = 30.0;

/// Reply when the completion service fails
pub const APOLOGY_MESSAGE: &str =
    "I apologize, but I'm having trouble generating a response right now. Please try again later.";

/// Reply when a turn exceeds its deadline
pub const TIMEOUT_MESSAGE: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";
