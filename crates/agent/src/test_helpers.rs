//! Shared fakes for router and orchestrator tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use vantage_core::completion::{CompletionRequest, CompletionResponse, CompletionService};
use vantage_core::error::{CompletionError, ProviderError};
use vantage_core::retrieval::{ProviderAnswer, ProviderClient};

/// A completion service that replays a script of replies in order and
/// records every request it receives.
///
/// Panics if more calls are made than replies provided.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Router reply followed by a synthesis reply.
    pub fn routed(decision_json: &str, synthesis: &str) -> Self {
        Self::new(vec![Ok(decision_json.into()), Ok(synthesis.into())])
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        let model = request.model.clone();
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedCompletion: no reply for call #{call}"));
        reply.map(|content| CompletionResponse {
            content,
            model,
            usage: None,
        })
    }
}

/// Build a router reply.
pub fn decision_json(action: &str, query: &str, save_payload: Option<&str>, category: &str) -> String {
    serde_json::json!({
        "action": action,
        "query": query,
        "saveIntent": save_payload.is_some(),
        "savePayload": save_payload,
        "category": category,
    })
    .to_string()
}

/// How a [`FakeProvider`] behaves when fetched.
pub enum Behavior {
    Answer(String),
    Fail,
    Hang,
}

/// Provider client with a call counter and a record of the queries it saw.
pub struct FakeProvider {
    id: String,
    behavior: Behavior,
    queries: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn answering(id: &str, answer: &str) -> Self {
        Self::with(id, Behavior::Answer(answer.into()))
    }

    pub fn failing(id: &str) -> Self {
        Self::with(id, Behavior::Fail)
    }

    pub fn hanging(id: &str) -> Self {
        Self::with(id, Behavior::Hang)
    }

    fn with(id: &str, behavior: Behavior) -> Self {
        Self {
            id: id.into(),
            behavior,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderClient for FakeProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, query: &str, _timeout: Duration) -> Result<ProviderAnswer, ProviderError> {
        self.queries.lock().unwrap().push(query.to_string());
        match &self.behavior {
            Behavior::Answer(text) => Ok(ProviderAnswer::text(text.clone())),
            Behavior::Fail => Err(ProviderError::Transport {
                provider: self.id.clone(),
                reason: "connection refused".into(),
            }),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ProviderError::Cancelled(self.id.clone()))
            }
        }
    }
}
