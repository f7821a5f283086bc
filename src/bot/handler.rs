//! Activity handler: turns inbound message activities into exactly one reply

use super::activity::Activity;
use super::connector::ChatTransport;
use crate::config::BotSettings;
use crate::metrics::Metrics;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info};

/// Routes inbound activities to the orchestrator and replies over the transport
pub struct ActivityHandler {
    orchestrator: Arc<Orchestrator>,
    transport: Arc<dyn ChatTransport>,
    settings: BotSettings,
    metrics: Option<Arc<Metrics>>,
}

impl ActivityHandler {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        transport: Arc<dyn ChatTransport>,
        settings: BotSettings,
    ) -> Self {
        Self {
            orchestrator,
            transport,
            settings,
            metrics: None,
        }
    }

    /// Count failed deliveries in the given metrics
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Handle one inbound activity
    pub async fn on_activity(&self, activity: Activity) -> Result<()> {
        if activity.is_message() {
            self.on_message(activity).await
        } else {
            debug!("Ignoring {} activity", activity.activity_type);
            Ok(())
        }
    }

    async fn on_message(&self, activity: Activity) -> Result<()> {
        info!("Received a message");

        let Some(query) = activity.query_text() else {
            return self
                .deliver(&activity, self.settings.empty_message_reply.clone())
                .await;
        };

        if self.settings.send_typing {
            self.send_typing(&activity).await;
        }

        let reply = self
            .orchestrator
            .handle_turn(query, activity.value.clone())
            .await;

        self.deliver(&activity, reply).await
    }

    /// Best effort, bounded by `typing_timeout_ms` so a slow connector cannot delay the turn
    async fn send_typing(&self, activity: &Activity) {
        let limit = Duration::from_millis(self.settings.typing_timeout_ms);
        match timeout(limit, self.transport.send_activity(&activity.create_typing())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("Failed to send typing indicator: {}", e),
            Err(_) => debug!("Typing indicator not delivered within {:?}", limit),
        }
    }

    /// Send the reply; on failure, make one attempt to send the turn-error message
    async fn deliver(&self, activity: &Activity, text: String) -> Result<()> {
        let Err(e) = self.transport.send_activity(&activity.create_reply(text)).await else {
            return Ok(());
        };

        error!("[on_turn_error] unhandled error: {}", e);
        if let Some(ref metrics) = self.metrics {
            metrics.record_delivery_failure();
        }

        self.transport
            .send_activity(&activity.create_reply(self.settings.turn_error_message.clone()))
            .await
    }
}
