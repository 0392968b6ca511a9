//! Fakes shared by the gateway's tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vantage_agent::{IntentRouter, Orchestrator};
use vantage_core::archive::{ArchiveRecord, ArchiveSink};
use vantage_core::completion::{CompletionRequest, CompletionResponse, CompletionService};
use vantage_core::error::{CompactionError, CompletionError, MemoryError};
use vantage_core::event::EventBus;
use vantage_core::message::ConversationTurn;
use vantage_memory::{Compactor, InMemoryCache, MemoryStore};
use vantage_retrieval::RetrievalCascade;

use crate::GatewayState;
use crate::api_v1::SharedState;

/// Replays router and synthesis replies in order. Panics when exhausted.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }

    pub fn routed(decision_json: &str, synthesis: &str) -> Self {
        Self::new(vec![Ok(decision_json.into()), Ok(synthesis.into())])
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
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedCompletion: script exhausted");
        reply.map(|content| CompletionResponse {
            content,
            model: request.model,
            usage: None,
        })
    }
}

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

/// Archive sink that keeps records in memory.
#[derive(Default)]
pub struct RecordingArchive {
    records: Mutex<Vec<ArchiveRecord>>,
}

impl RecordingArchive {
    pub fn records(&self) -> Vec<ArchiveRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArchiveSink for RecordingArchive {
    fn name(&self) -> &str {
        "recording"
    }

    async fn archive(&self, record: ArchiveRecord) -> Result<(), MemoryError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

struct NoopCompactor;

#[async_trait]
impl Compactor for NoopCompactor {
    async fn compact(&self, _turns: &[ConversationTurn]) -> Result<String, CompactionError> {
        Ok("summary".into())
    }
}

pub fn memory_store() -> MemoryStore {
    MemoryStore::new(Arc::new(InMemoryCache::new()), Arc::new(NoopCompactor))
}

/// Gateway state over `completion`, an empty retrieval chain and
/// in-process memory.
pub fn test_state(completion: ScriptedCompletion) -> (SharedState, Arc<RecordingArchive>) {
    let completion: Arc<dyn CompletionService> = Arc::new(completion);
    let event_bus = Arc::new(EventBus::default());
    let router = IntentRouter::new(completion.clone(), "test-model", Duration::from_secs(5));
    let orchestrator = Orchestrator::new(
        router,
        Arc::new(RetrievalCascade::new()),
        Arc::new(memory_store()),
        completion,
        event_bus,
    );
    let archive = Arc::new(RecordingArchive::default());
    let state = Arc::new(GatewayState {
        orchestrator: Arc::new(orchestrator),
        archive: archive.clone(),
    });
    (state, archive)
}
