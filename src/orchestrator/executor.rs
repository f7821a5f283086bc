//! Turn orchestration: search, then generate, under one deadline

use super::context::build_context_block;
use super::models::{InboundMessage, TurnOutcome, TurnReport};
use crate::completion::{Completer, CompletionRequest};
use crate::config::Settings;
use crate::metrics::Metrics;
use crate::retrieval::{Document, Retriever};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Fixed policy applied to every turn
#[derive(Debug, Clone)]
pub struct TurnPolicy {
    /// Documents requested from search
    pub top: usize,
    /// Bound on search plus generation
    pub deadline: Duration,
    pub system_instruction: String,
    pub max_output_tokens: Option<u32>,
    pub aux_label: String,
    pub apology_message: String,
    pub timeout_message: String,
}

impl Default for TurnPolicy {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl TurnPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            top: settings.retrieval.top,
            deadline: settings.orchestrator.deadline(),
            system_instruction: settings.completion.system_instruction.clone(),
            max_output_tokens: settings.completion.max_tokens,
            aux_label: settings.orchestrator.aux_label.clone(),
            apology_message: non_empty(&settings.orchestrator.apology_message, crate::APOLOGY_MESSAGE),
            timeout_message: non_empty(&settings.orchestrator.timeout_message, crate::TIMEOUT_MESSAGE),
        }
    }

    /// Set the overall deadline
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Set the number of documents requested
    pub fn with_top(mut self, top: usize) -> Self {
        self.top = top;
        self
    }
}

fn non_empty(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Orchestrator that answers one turn with retrieval-augmented generation.
///
/// Holds only read-only collaborator handles, so one instance serves
/// concurrent turns.
pub struct Orchestrator {
    retriever: Arc<dyn Retriever>,
    completer: Arc<dyn Completer>,
    policy: TurnPolicy,
    metrics: Option<Arc<Metrics>>,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(
        retriever: Arc<dyn Retriever>,
        completer: Arc<dyn Completer>,
        policy: TurnPolicy,
    ) -> Self {
        Self {
            retriever,
            completer,
            policy,
            metrics: None,
        }
    }

    /// Record every turn in the given metrics
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn policy(&self) -> &TurnPolicy {
        &self.policy
    }

    /// Answer one turn. Always returns a non-empty reply.
    pub async fn handle_turn(&self, user_message: &str, aux_payload: Option<Value>) -> String {
        self.run_turn(InboundMessage::new(user_message, aux_payload))
            .await
            .reply
    }

    /// Answer one turn and report how it went
    pub async fn run_turn(&self, message: InboundMessage) -> TurnReport {
        let span = info_span!("turn", turn_id = %Uuid::new_v4());
        self.run_with_deadline(message).instrument(span).await
    }

    async fn run_with_deadline(&self, message: InboundMessage) -> TurnReport {
        let start = Instant::now();
        info!("User message: {}", message.text);
        debug!("Auxiliary payload: {}", message.aux_payload);

        // Dropping the pipeline on timeout also drops its in-flight requests
        let mut report = match timeout(self.policy.deadline, self.pipeline(&message)).await {
            Ok(report) => report,
            Err(_) => {
                warn!("Turn timed out after {:?}", self.policy.deadline);
                TurnReport {
                    reply: self.policy.timeout_message.clone(),
                    outcome: TurnOutcome::TimedOut,
                    document_count: 0,
                    search_ms: None,
                    generate_ms: None,
                    total_ms: 0,
                }
            }
        };
        report.total_ms = elapsed_ms(start);

        info!(
            outcome = report.outcome.as_str(),
            total_ms = report.total_ms,
            "Turn finished"
        );

        if let Some(ref metrics) = self.metrics {
            metrics.record_turn(&report);
        }

        report
    }

    async fn pipeline(&self, message: &InboundMessage) -> TurnReport {
        let search_start = Instant::now();
        let (documents, search_ok) = self.search(&message.text).await;
        let search_ms = elapsed_ms(search_start);
        debug!(
            "Search completed in {}ms with {} documents",
            search_ms,
            documents.len()
        );

        let request = CompletionRequest {
            system_instruction: self.policy.system_instruction.clone(),
            context_block: build_context_block(
                &documents,
                &message.aux_payload,
                &self.policy.aux_label,
            ),
            user_query: message.text.clone(),
            max_output_tokens: self.policy.max_output_tokens,
        };

        let generate_start = Instant::now();
        let (reply, outcome) = match self.completer.complete(&request).await {
            Ok(text) if !text.trim().is_empty() => {
                let outcome = if search_ok {
                    TurnOutcome::Answered
                } else {
                    TurnOutcome::AnsweredWithoutContext
                };
                (text, outcome)
            }
            Ok(_) => {
                error!("Completion via {} returned empty text", self.completer.name());
                (self.policy.apology_message.clone(), TurnOutcome::GenerationFailed)
            }
            Err(e) => {
                error!("Error generating response via {}: {}", self.completer.name(), e);
                (self.policy.apology_message.clone(), TurnOutcome::GenerationFailed)
            }
        };
        let generate_ms = elapsed_ms(generate_start);
        debug!("Response generated in {}ms", generate_ms);

        TurnReport {
            reply,
            outcome,
            document_count: documents.len(),
            search_ms: Some(search_ms),
            generate_ms: Some(generate_ms),
            total_ms: 0,
        }
    }

    /// Search never fails the turn; errors become an empty result set
    async fn search(&self, query: &str) -> (Vec<Document>, bool) {
        match self.retriever.search(query, self.policy.top).await {
            Ok(documents) => (documents, true),
            Err(e) => {
                warn!("Error searching documents via {}: {}", self.retriever.name(), e);
                (Vec::new(), false)
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
