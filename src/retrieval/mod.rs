//! Retrieval module
//!
//! Defines the Retriever trait, the Azure AI Search implementation and the
//! retry decorator used in front of it.

mod azure;
mod retry;
mod traits;

pub use azure::AzureSearch;
pub use retry::{RetryPolicy, RetryingRetriever};
pub use traits::*;

use crate::config::RetrievalSettings;
use crate::network::HttpClient;
use std::sync::Arc;

/// Build the configured retriever
pub fn from_settings(client: HttpClient, settings: &RetrievalSettings) -> Arc<dyn Retriever> {
    let azure: Arc<dyn Retriever> = Arc::new(AzureSearch::new(client, settings));
    if settings.max_retries == 0 {
        return azure;
    }
    Arc::new(RetryingRetriever::new(azure, RetryPolicy::from(settings)))
}
