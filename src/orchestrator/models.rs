//! Turn-scoped data models

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One inbound user message with its auxiliary payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// User query
    pub text: String,
    /// Opaque structured payload; never null
    #[serde(default = "empty_payload", deserialize_with = "deserialize_payload")]
    pub aux_payload: Value,
}

impl InboundMessage {
    pub fn new(text: impl Into<String>, aux_payload: Option<Value>) -> Self {
        Self {
            text: text.into(),
            aux_payload: normalize_payload(aux_payload),
        }
    }
}

fn empty_payload() -> Value {
    Value::Object(Default::default())
}

fn deserialize_payload<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
    Option::<Value>::deserialize(deserializer).map(normalize_payload)
}

/// Absent or null payloads become an empty object
pub fn normalize_payload(payload: Option<Value>) -> Value {
    match payload {
        None | Some(Value::Null) => empty_payload(),
        Some(value) => value,
    }
}

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// Search and generation both succeeded
    Answered,
    /// Search failed and the model answered from the query alone
    AnsweredWithoutContext,
    /// Generation failed; the apology was returned
    GenerationFailed,
    /// The deadline elapsed; the timeout reply was returned
    TimedOut,
}

impl TurnOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnOutcome::Answered => "answered",
            TurnOutcome::AnsweredWithoutContext => "answered_without_context",
            TurnOutcome::GenerationFailed => "generation_failed",
            TurnOutcome::TimedOut => "timed_out",
        }
    }
}

/// Result of one orchestrated turn
#[derive(Debug, Clone, Serialize)]
pub struct TurnReport {
    /// Text shown to the user; never empty
    pub reply: String,
    pub outcome: TurnOutcome,
    /// Documents passed to generation
    pub document_count: usize,
    pub search_ms: Option<u64>,
    pub generate_ms: Option<u64>,
    pub total_ms: u64,
}
