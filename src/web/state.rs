//! Application state shared across handlers

use crate::bot::{ActivityHandler, ChatTransport, ConnectorClient};
use crate::completion::OpenAi;
use crate::config::Settings;
use crate::metrics::Metrics;
use crate::network::HttpClient;
use crate::orchestrator::{Orchestrator, TurnPolicy};
use crate::retrieval;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Turn orchestrator
    pub orchestrator: Arc<Orchestrator>,
    /// Bot Framework activity handler
    pub bot: Arc<ActivityHandler>,
    /// Turn metrics
    pub metrics: Arc<Metrics>,
    /// Template renderer
    pub templates: Arc<super::Templates>,
}

impl AppState {
    /// Create application state with the configured collaborators
    pub fn new(settings: Settings, client: HttpClient) -> anyhow::Result<Self> {
        let retriever = retrieval::from_settings(client.clone(), &settings.retrieval);
        let completer = Arc::new(OpenAi::new(client.clone(), &settings.completion));
        let transport = Arc::new(ConnectorClient::new(client, &settings.bot));
        let metrics = Arc::new(Metrics::new());

        let policy = TurnPolicy::from_settings(&settings);
        let orchestrator =
            Orchestrator::new(retriever, completer, policy).with_metrics(metrics.clone());

        Self::from_parts(settings, Arc::new(orchestrator), transport, metrics)
    }

    /// Create application state around an existing orchestrator and transport
    pub fn from_parts(
        settings: Settings,
        orchestrator: Arc<Orchestrator>,
        transport: Arc<dyn ChatTransport>,
        metrics: Arc<Metrics>,
    ) -> anyhow::Result<Self> {
        let bot = ActivityHandler::new(orchestrator.clone(), transport, settings.bot.clone())
            .with_metrics(metrics.clone());
        let templates = Arc::new(super::Templates::new()?);

        Ok(Self {
            settings: Arc::new(settings),
            orchestrator,
            bot: Arc::new(bot),
            metrics,
            templates,
        })
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
