//! In-memory collaborators shared by unit tests

use crate::bot::{Activity, ChatTransport};
use crate::completion::{Completer, CompletionError, CompletionRequest};
use crate::orchestrator::{Orchestrator, TurnPolicy};
use crate::retrieval::{Document, RetrievalError, Retriever};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Long enough to outlast any deadline under test
const HANG: Duration = Duration::from_secs(3600);

pub enum SearchBehavior {
    Return(Vec<Document>),
    /// Fails with a transient HTTP 503
    Fail,
    Hang,
}

/// Scripted retriever that records the `top` of every call
pub struct FakeRetriever {
    behavior: SearchBehavior,
    tops: Mutex<Vec<usize>>,
}

impl FakeRetriever {
    pub fn new(behavior: SearchBehavior) -> Self {
        Self {
            behavior,
            tops: Mutex::new(Vec::new()),
        }
    }

    pub fn returning(documents: Vec<Document>) -> Self {
        Self::new(SearchBehavior::Return(documents))
    }

    pub fn failing() -> Self {
        Self::new(SearchBehavior::Fail)
    }

    pub fn hanging() -> Self {
        Self::new(SearchBehavior::Hang)
    }

    pub fn tops(&self) -> Vec<usize> {
        self.tops.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.tops.lock().unwrap().len()
    }
}

#[async_trait]
impl Retriever for FakeRetriever {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search(&self, _query: &str, top: usize) -> Result<Vec<Document>, RetrievalError> {
        self.tops.lock().unwrap().push(top);
        match &self.behavior {
            SearchBehavior::Return(docs) => Ok(docs.iter().take(top).cloned().collect()),
            SearchBehavior::Fail => Err(RetrievalError::Http {
                status: 503,
                body: "network error".to_string(),
                transient: true,
            }),
            SearchBehavior::Hang => {
                tokio::time::sleep(HANG).await;
                Ok(Vec::new())
            }
        }
    }
}

pub enum CompleteBehavior {
    /// Replies `answer to: <query>`
    Echo,
    Reply(&'static str),
    Fail,
    Hang,
}

/// Scripted completer that records every request
pub struct FakeCompleter {
    behavior: CompleteBehavior,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeCompleter {
    pub fn new(behavior: CompleteBehavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn echo() -> Self {
        Self::new(CompleteBehavior::Echo)
    }

    pub fn reply(text: &'static str) -> Self {
        Self::new(CompleteBehavior::Reply(text))
    }

    pub fn failing() -> Self {
        Self::new(CompleteBehavior::Fail)
    }

    pub fn hanging() -> Self {
        Self::new(CompleteBehavior::Hang)
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Completer for FakeCompleter {
    fn name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.behavior {
            CompleteBehavior::Echo => Ok(format!("answer to: {}", request.user_query)),
            CompleteBehavior::Reply(text) => Ok(text.to_string()),
            CompleteBehavior::Fail => Err(CompletionError::Http {
                status: 500,
                body: String::new(),
            }),
            CompleteBehavior::Hang => {
                tokio::time::sleep(HANG).await;
                Ok("too late".to_string())
            }
        }
    }
}

/// Orchestrator over an empty index with default policy
pub fn orchestrator(completer: FakeCompleter) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(
        Arc::new(FakeRetriever::returning(Vec::new())),
        Arc::new(completer),
        TurnPolicy::default(),
    ))
}

/// Records delivered activities; rejects message activities when `reject_messages` is set
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<Activity>>,
    pub reject_messages: usize,
    /// Delay before a typing activity is acknowledged
    pub typing_delay: Option<Duration>,
}

impl RecordingTransport {
    pub fn rejecting(count: usize) -> Self {
        Self {
            reject_messages: count,
            ..Default::default()
        }
    }

    pub fn stalling_typing(delay: Duration) -> Self {
        Self {
            typing_delay: Some(delay),
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Activity> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|a| a.is_message())
            .filter_map(|a| a.text)
            .collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_activity(&self, activity: &Activity) -> anyhow::Result<()> {
        let rejected = {
            let mut sent = self.sent.lock().unwrap();
            let rejected_so_far = sent.iter().filter(|a| a.is_message()).count();
            sent.push(activity.clone());
            activity.is_message() && rejected_so_far < self.reject_messages
        };
        if rejected {
            anyhow::bail!("connector unavailable");
        }
        if let Some(delay) = self.typing_delay.filter(|_| !activity.is_message()) {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}
