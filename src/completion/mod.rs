//! Completion module
//!
//! Defines the Completer trait and the OpenAI chat-completions implementation.

mod openai;
mod traits;

pub use openai::{ChatCompletionRequest, ChatMessage, OpenAi};
pub use traits::*;
