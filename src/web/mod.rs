//! Web server module
//!
//! Provides the Bot Framework endpoint, the direct RAG API and the task page.

mod handlers;
mod routes;
mod state;
mod templates;

pub use handlers::{RagRequest, RagResponse};
pub use routes::create_router;
pub use state::AppState;
pub use templates::Templates;
