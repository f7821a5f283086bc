//! Turn orchestration module
//!
//! Runs the search and generation stages for one user message, absorbs
//! collaborator failures and enforces the overall deadline.

mod context;
mod executor;
mod models;

pub use context::build_context_block;
pub use executor::{Orchestrator, TurnPolicy};
pub use models::*;
