//! Context block composition

use crate::retrieval::Document;
use serde_json::Value;

/// Serialize search results and the auxiliary payload into one LLM-readable block.
///
/// Results come first, the payload second.
pub fn build_context_block(documents: &[Document], aux_payload: &Value, aux_label: &str) -> String {
    let results = serde_json::to_string(documents).unwrap_or_else(|_| "[]".to_string());
    let payload = serde_json::to_string(aux_payload).unwrap_or_else(|_| "{}".to_string());
    format!("Search Results: {}\n\n{}: {}", results, aux_label, payload)
}
