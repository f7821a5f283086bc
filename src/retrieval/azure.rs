//! Azure AI Search retriever

use super::traits::*;
use crate::config::RetrievalSettings;
use crate::network::{HttpClient, HttpRequest};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Azure AI Search REST client for a single index
pub struct AzureSearch {
    client: HttpClient,
    endpoint: String,
    index: String,
    api_key: Option<String>,
    api_version: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    value: Vec<serde_json::Map<String, serde_json::Value>>,
}

impl AzureSearch {
    pub fn new(client: HttpClient, settings: &RetrievalSettings) -> Self {
        Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            index: settings.index.clone(),
            api_key: settings.api_key.clone(),
            api_version: settings.api_version.clone(),
            timeout: settings.timeout(),
        }
    }

    fn search_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search",
            self.endpoint,
            urlencoding::encode(&self.index)
        )
    }

    fn request(&self, query: &str, top: usize) -> Result<HttpRequest, RetrievalError> {
        if self.endpoint.is_empty() {
            return Err(RetrievalError::NotConfigured("endpoint".to_string()));
        }

        let mut request = HttpRequest::post(self.search_url())
            .param("api-version", &self.api_version)
            .json(serde_json::json!({
                "search": query,
                "top": top,
            }))
            .timeout(self.timeout);

        if let Some(ref key) = self.api_key {
            request = request.header("api-key", key);
        }

        Ok(request)
    }

    /// Keep only the stored fields; `@search.score` and friends are index metadata
    fn into_document(mut fields: serde_json::Map<String, serde_json::Value>) -> Document {
        fields.retain(|key, _| !key.starts_with("@search."));
        Document(serde_json::Value::Object(fields))
    }
}

#[async_trait]
impl Retriever for AzureSearch {
    fn name(&self) -> &str {
        "azure_search"
    }

    async fn search(&self, query: &str, top: usize) -> Result<Vec<Document>, RetrievalError> {
        let request = self.request(query, top)?;
        let response = self.client.execute(request).await?;

        if !response.is_success() {
            return Err(RetrievalError::Http {
                transient: response.is_rate_limited() || response.is_server_error(),
                status: response.status,
                body: response.text,
            });
        }

        let parsed: SearchResponse = response.json()?;
        Ok(parsed
            .value
            .into_iter()
            .take(top)
            .map(Self::into_document)
            .collect())
    }
}
