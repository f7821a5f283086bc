//! Settings structures for RAG-Relay configuration

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub bot: BotSettings,
    pub orchestrator: OrchestratorSettings,
    pub retrieval: RetrievalSettings,
    pub completion: CompletionSettings,
    pub outgoing: OutgoingSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("RAG_RELAY_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("RAG_RELAY_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("MICROSOFT_APP_ID") {
            self.bot.app_id = Some(val);
        }
        if let Ok(val) = std::env::var("MICROSOFT_APP_PASSWORD") {
            self.bot.app_password = Some(val);
        }
        if let Ok(val) = std::env::var("AZURE_SEARCH_ENDPOINT") {
            self.retrieval.endpoint = val;
        }
        if let Ok(val) = std::env::var("AZURE_SEARCH_KEY") {
            self.retrieval.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("AZURE_SEARCH_INDEX") {
            self.retrieval.index = val;
        }
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            self.completion.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("OPENAI_MODEL") {
            self.completion.model = val;
        }
    }

    /// Collect configuration problems that will make collaborators fail at runtime.
    ///
    /// These are reported, not fatal: every collaborator failure is absorbed
    /// per turn, so the service can still start and answer with a fallback.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.retrieval.endpoint.trim().is_empty() {
            problems.push("retrieval.endpoint is not set (AZURE_SEARCH_ENDPOINT)".to_string());
        } else if url::Url::parse(&self.retrieval.endpoint).is_err() {
            problems.push(format!(
                "retrieval.endpoint is not a valid URL: {}",
                self.retrieval.endpoint
            ));
        }
        if is_blank(&self.retrieval.api_key) {
            problems.push("retrieval.api_key is not set (AZURE_SEARCH_KEY)".to_string());
        }
        if is_blank(&self.completion.api_key) {
            problems.push("completion.api_key is not set (OPENAI_API_KEY)".to_string());
        }
        if self.bot.app_id.is_some() && is_blank(&self.bot.app_password) {
            problems.push("bot.app_password is required when bot.app_id is set".to_string());
        }
        for (name, secs) in [
            ("orchestrator.deadline_secs", self.orchestrator.deadline_secs),
            ("retrieval.timeout_secs", self.retrieval.timeout_secs),
            ("completion.timeout_secs", self.completion.timeout_secs),
            ("outgoing.request_timeout", self.outgoing.request_timeout),
        ] {
            if secs.is_nan() || secs <= 0.0 {
                problems.push(format!("{} must be positive, got {}", name, secs));
            }
        }
        if self.bot.typing_timeout_ms == 0 {
            problems.push("bot.typing_timeout_ms must be positive".to_string());
        }
        if self.bot.trusted_service_urls.is_empty() && self.bot.app_id.is_some() {
            problems.push(
                "bot.trusted_service_urls is empty; no replies can be sent with the app token"
                    .to_string(),
            );
        }

        problems
    }
}

/// Convert configured seconds into a duration; non-positive or unparseable
/// values fall back to a millisecond, huge ones are capped at a day
pub fn secs_to_duration(secs: f64) -> Duration {
    Duration::from_secs_f64(secs.max(0.001).min(86_400.0))
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name displayed on the task page
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "RAG-Relay".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 3000,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

/// Bot Framework transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotSettings {
    /// Microsoft app id; unset means the emulator (no outbound auth)
    pub app_id: Option<String>,
    /// Microsoft app password
    pub app_password: Option<String>,
    /// OAuth token endpoint
    pub token_url: String,
    /// OAuth scope for the connector service
    pub oauth_scope: String,
    /// Send a typing indicator before orchestration
    pub send_typing: bool,
    /// Longest wait for the typing indicator before orchestration starts anyway
    pub typing_timeout_ms: u64,
    /// Hosts the app token may be sent to; `*.` matches any subdomain
    pub trusted_service_urls: Vec<String>,
    /// Reply sent when the turn itself fails to deliver
    pub turn_error_message: String,
    /// Reply sent for message activities without text
    pub empty_message_reply: String,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            app_id: None,
            app_password: None,
            token_url: "https://login.microsoftonline.com/botframework.com/oauth2/v2.0/token"
                .to_string(),
            oauth_scope: "https://api.botframework.com/.default".to_string(),
            send_typing: true,
            typing_timeout_ms: 2000,
            trusted_service_urls: vec![
                "*.botframework.com".to_string(),
                "smba.trafficmanager.net".to_string(),
                "*.teams.microsoft.com".to_string(),
            ],
            turn_error_message: "The bot encountered an error or bug.".to_string(),
            empty_message_reply: "Please send me a question and I'll look it up.".to_string(),
        }
    }
}

/// Turn orchestration policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Overall deadline for search plus generation, in seconds
    pub deadline_secs: f64,
    /// Label used for the auxiliary payload in the context block
    pub aux_label: String,
    /// Reply when generation fails
    pub apology_message: String,
    /// Reply when the deadline elapses
    pub timeout_message: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            deadline_secs: crate::DEFAULT_DEADLINE_SECS,
            aux_label: "LlamaCloud Data".to_string(),
            apology_message: crate::APOLOGY_MESSAGE.to_string(),
            timeout_message: crate::TIMEOUT_MESSAGE.to_string(),
        }
    }
}

impl OrchestratorSettings {
    pub fn deadline(&self) -> Duration {
        secs_to_duration(self.deadline_secs)
    }
}

/// Search collaborator settings (Azure AI Search)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Service endpoint, e.g. https://<name>.search.windows.net
    pub endpoint: String,
    /// Index name
    pub index: String,
    /// Query key
    pub api_key: Option<String>,
    /// REST API version
    pub api_version: String,
    /// Number of top documents requested
    pub top: usize,
    /// Per-attempt timeout in seconds
    pub timeout_secs: f64,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// First backoff interval
    pub initial_interval_ms: u64,
    /// Backoff ceiling
    pub max_interval_ms: u64,
    /// Jitter applied to each backoff interval (0.0-1.0)
    pub randomization_factor: f64,
}

impl RetrievalSettings {
    pub fn timeout(&self) -> Duration {
        secs_to_duration(self.timeout_secs)
    }
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            index: "your-index-name".to_string(),
            api_key: None,
            api_version: "2023-11-01".to_string(),
            top: crate::DEFAULT_TOP,
            timeout_secs: 10.0,
            max_retries: 2,
            initial_interval_ms: 200,
            max_interval_ms: 2000,
            randomization_factor: 0.3,
        }
    }
}

/// Completion collaborator settings (OpenAI chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// API base URL
    pub base_url: String,
    /// Bearer key
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Fixed system instruction
    pub system_instruction: String,
    /// Output cap; none sends no limit
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Request timeout in seconds
    pub timeout_secs: f64,
}

impl CompletionSettings {
    pub fn timeout(&self) -> Duration {
        secs_to_duration(self.timeout_secs)
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            system_instruction: "You are a helpful assistant.".to_string(),
            max_tokens: Some(150),
            temperature: None,
            timeout_secs: 25.0,
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max idle connections per host
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl OutgoingSettings {
    pub fn timeout(&self) -> Duration {
        secs_to_duration(self.request_timeout)
    }
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 30.0,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}
