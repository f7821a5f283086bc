//! Bot Framework connector client
//!
//! Sends activities back to the channel's service URL, authenticating with
//! an app token obtained through the OAuth client-credentials flow.

use super::activity::Activity;
use crate::config::BotSettings;
use crate::network::{HttpClient, HttpRequest};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Tokens are refreshed this long before they expire
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Outbound side of the chat transport
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Deliver one activity to its conversation
    async fn send_activity(&self, activity: &Activity) -> Result<()>;
}

#[derive(Debug, Clone)]
struct AppCredentials {
    app_id: String,
    app_password: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    ttl: Duration,
}

struct TokenExpiry;

impl Expiry<String, CachedToken> for TokenExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedToken,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Connector client for replying to Bot Framework conversations
pub struct ConnectorClient {
    client: HttpClient,
    credentials: Option<AppCredentials>,
    token_url: String,
    oauth_scope: String,
    trusted_hosts: Vec<String>,
    tokens: Cache<String, CachedToken>,
}

impl ConnectorClient {
    pub fn new(client: HttpClient, settings: &BotSettings) -> Self {
        // Without an app id the bot talks to the emulator unauthenticated
        let credentials = match (&settings.app_id, &settings.app_password) {
            (Some(id), password) if !id.trim().is_empty() => Some(AppCredentials {
                app_id: id.clone(),
                app_password: password.clone().unwrap_or_default(),
            }),
            _ => None,
        };

        let tokens = Cache::builder()
            .max_capacity(4)
            .expire_after(TokenExpiry)
            .build();

        Self {
            client,
            credentials,
            token_url: settings.token_url.clone(),
            oauth_scope: settings.oauth_scope.clone(),
            trusted_hosts: settings
                .trusted_service_urls
                .iter()
                .map(|h| h.trim().to_ascii_lowercase())
                .collect(),
            tokens,
        }
    }

    /// Whether outbound requests carry an app token
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    /// Whether the app token may be sent to `service_url`.
    ///
    /// The inbound activity names its own service URL, so only hosts on the
    /// configured list ever see the token.
    pub fn is_trusted_service_url(&self, service_url: &str) -> bool {
        let Some(host) = url::Url::parse(service_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        else {
            return false;
        };
        self.trusted_hosts
            .iter()
            .any(|pattern| host_matches(pattern, &host))
    }

    async fn token(&self) -> Result<Option<String>> {
        let Some(ref credentials) = self.credentials else {
            return Ok(None);
        };

        let cached = self
            .tokens
            .try_get_with(credentials.app_id.clone(), self.fetch_token(credentials))
            .await
            .map_err(|e| anyhow!("failed to acquire bot token: {}", e))?;

        Ok(Some(cached.token))
    }

    async fn fetch_token(&self, credentials: &AppCredentials) -> Result<CachedToken> {
        debug!("Requesting bot token for app {}", credentials.app_id);

        let form = HashMap::from([
            ("grant_type".to_string(), "client_credentials".to_string()),
            ("client_id".to_string(), credentials.app_id.clone()),
            ("client_secret".to_string(), credentials.app_password.clone()),
            ("scope".to_string(), self.oauth_scope.clone()),
        ]);

        let response = self
            .client
            .execute(HttpRequest::post(&self.token_url).form(form))
            .await
            .context("token request failed")?;

        if !response.is_success() {
            return Err(anyhow!(
                "token endpoint returned HTTP {}: {}",
                response.status,
                response.text
            ));
        }

        let token: TokenResponse = response.json().context("malformed token response")?;
        let lifetime = Duration::from_secs(token.expires_in);
        let ttl = if lifetime > TOKEN_REFRESH_MARGIN * 2 {
            lifetime - TOKEN_REFRESH_MARGIN
        } else {
            (lifetime / 2).max(Duration::from_secs(1))
        };

        Ok(CachedToken {
            token: token.access_token,
            ttl,
        })
    }

    /// Connector URL for an activity: a reply when `replyToId` is set
    pub fn activity_url(activity: &Activity) -> Result<String> {
        let service_url = activity
            .service_url
            .as_deref()
            .ok_or_else(|| anyhow!("activity has no serviceUrl"))?;
        let conversation = activity
            .conversation
            .as_ref()
            .ok_or_else(|| anyhow!("activity has no conversation"))?;

        let mut url = format!(
            "{}/v3/conversations/{}/activities",
            service_url.trim_end_matches('/'),
            urlencoding::encode(&conversation.id)
        );
        if let Some(ref reply_to) = activity.reply_to_id {
            url.push('/');
            url.push_str(&urlencoding::encode(reply_to));
        }
        Ok(url)
    }
}

/// `*.example.com` matches subdomains of example.com; anything else is an exact host
fn host_matches(pattern: &str, host: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(domain) => host
            .strip_suffix(domain)
            .is_some_and(|sub| sub.len() > 1 && sub.ends_with('.')),
        None => host == pattern,
    }
}

#[async_trait]
impl ChatTransport for ConnectorClient {
    async fn send_activity(&self, activity: &Activity) -> Result<()> {
        let url = Self::activity_url(activity)?;
        let mut request = HttpRequest::post(url).json(serde_json::to_value(activity)?);

        if self.is_authenticated() {
            let service_url = activity.service_url.as_deref().unwrap_or_default();
            if !self.is_trusted_service_url(service_url) {
                return Err(anyhow!(
                    "refusing to send the app token to untrusted serviceUrl {}",
                    service_url
                ));
            }
            if let Some(token) = self.token().await? {
                request = request.bearer(token);
            }
        }

        let response = self
            .client
            .execute(request)
            .await
            .context("connector request failed")?;

        if !response.is_success() {
            return Err(anyhow!(
                "connector returned HTTP {}: {}",
                response.status,
                response.text
            ));
        }

        debug!("Delivered {} activity", activity.activity_type);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::activity::{ChannelAccount, ConversationAccount};
    use serde_json::json;
    use wiremock::matchers::{
        body_partial_json, body_string_contains, header, header_exists, method, path,
    };
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn inbound(service_url: &str) -> Activity {
        Activity {
            activity_type: "message".to_string(),
            id: Some("act-1".to_string()),
            service_url: Some(service_url.to_string()),
            conversation: Some(ConversationAccount {
                id: "conv-1".to_string(),
                ..Default::default()
            }),
            from: Some(ChannelAccount {
                id: "user-1".to_string(),
                name: None,
            }),
            recipient: Some(ChannelAccount {
                id: "bot-1".to_string(),
                name: None,
            }),
            text: Some("hello".to_string()),
            ..Default::default()
        }
    }

    fn settings(server: &MockServer, app_id: Option<&str>) -> BotSettings {
        BotSettings {
            app_id: app_id.map(str::to_string),
            app_password: Some("secret".to_string()),
            token_url: format!("{}/oauth2/token", server.uri()),
            trusted_service_urls: vec!["127.0.0.1".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_activity_url() {
        let reply = inbound("https://smba.example.net/amer/").create_reply("hi");
        assert_eq!(
            ConnectorClient::activity_url(&reply).unwrap(),
            "https://smba.example.net/amer/v3/conversations/conv-1/activities/act-1"
        );

        let mut missing = reply.clone();
        missing.service_url = None;
        assert!(ConnectorClient::activity_url(&missing).is_err());
    }

    #[tokio::test]
    async fn test_send_reply_with_cached_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(body_string_contains("grant_type=client_credentials"))
            .and(body_string_contains("client_id=app-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token_type": "Bearer",
                "expires_in": 3599,
                "access_token": "bot-token"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/v3/conversations/conv-1/activities/act-1"))
            .and(header("Authorization", "Bearer bot-token"))
            .and(body_partial_json(json!({"type": "message", "text": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "reply-1"})))
            .expect(2)
            .mount(&server)
            .await;

        let connector =
            ConnectorClient::new(HttpClient::new().unwrap(), &settings(&server, Some("app-1")));
        assert!(connector.is_authenticated());

        let reply = inbound(&server.uri()).create_reply("hi");
        connector.send_activity(&reply).await.unwrap();
        connector.send_activity(&reply).await.unwrap();
    }

    #[tokio::test]
    async fn test_emulator_mode_sends_without_token() {
        let server = MockServer::start().await;
        Mock::given(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(401))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v3/conversations/conv-1/activities/act-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let connector = ConnectorClient::new(HttpClient::new().unwrap(), &settings(&server, None));
        assert!(!connector.is_authenticated());

        let typing = inbound(&server.uri()).create_typing();
        connector.send_activity(&typing).await.unwrap();
    }

    #[tokio::test]
    async fn test_connector_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let connector = ConnectorClient::new(HttpClient::new().unwrap(), &settings(&server, None));
        let reply = inbound(&server.uri()).create_reply("hi");
        assert!(connector.send_activity(&reply).await.is_err());
    }

    #[test]
    fn test_host_patterns() {
        assert!(host_matches("*.botframework.com", "webchat.botframework.com"));
        assert!(host_matches("smba.trafficmanager.net", "smba.trafficmanager.net"));
        assert!(!host_matches("*.botframework.com", "botframework.com"));
        assert!(!host_matches("*.botframework.com", "evilbotframework.com"));
        assert!(!host_matches("*.botframework.com", "botframework.com.evil.example"));
        assert!(!host_matches("smba.trafficmanager.net", "smba.trafficmanager.net.evil.example"));
    }

    #[test]
    fn test_trusted_service_urls() {
        let connector = ConnectorClient::new(HttpClient::new().unwrap(), &BotSettings::default());
        assert!(connector.is_trusted_service_url("https://smba.trafficmanager.net/amer/"));
        assert!(connector.is_trusted_service_url("https://WebChat.BotFramework.com/"));
        assert!(!connector.is_trusted_service_url("https://evil.example/"));
        assert!(!connector.is_trusted_service_url("not a url"));
    }

    #[tokio::test]
    async fn test_untrusted_service_url_never_sees_token() {
        let server = MockServer::start().await;
        Mock::given(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "expires_in": 3599,
                "access_token": "bot-token"
            })))
            .expect(0)
            .mount(&server)
            .await;

        let settings = BotSettings {
            app_id: Some("app-1".to_string()),
            app_password: Some("secret".to_string()),
            token_url: format!("{}/oauth2/token", server.uri()),
            ..Default::default()
        };
        let connector = ConnectorClient::new(HttpClient::new().unwrap(), &settings);

        let reply = inbound(&server.uri()).create_reply("hi");
        let err = connector.send_activity(&reply).await.unwrap_err();
        assert!(err.to_string().contains("untrusted serviceUrl"));
    }
}
