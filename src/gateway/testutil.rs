//! Shared test doubles and harness for gateway tests.

use super::registry::Pending;
use super::Gateway;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;
use vigia_core::{
    config::{Config, MemoryConfig},
    error::VigiaError,
    message::{IncomingMessage, OutgoingMessage},
    traits::{Channel, FolderBrowser, ProcessingAgent},
    types::{AgentOutput, FileRef},
};
use vigia_memory::Store;

/// Channel that records every outgoing message.
pub(crate) struct MockChannel {
    pub sent: Arc<Mutex<Vec<OutgoingMessage>>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl Channel for MockChannel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, VigiaError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), VigiaError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn stop(&self) -> Result<(), VigiaError> {
        Ok(())
    }
}

/// Browser that serves scripted listings in order; an exhausted script
/// yields empty listings.
pub(crate) struct MockBrowser {
    responses: Mutex<VecDeque<Result<Vec<FileRef>, String>>>,
}

impl MockBrowser {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
        }
    }

    pub fn push_listing(&self, files: Vec<FileRef>) {
        self.responses.lock().unwrap().push_back(Ok(files));
    }

    pub fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl FolderBrowser for MockBrowser {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_children(&self, _folder_id: &str) -> Result<Vec<FileRef>, VigiaError> {
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(files)) => Ok(files),
            Some(Err(e)) => Err(VigiaError::Storage(e)),
            None => Ok(Vec::new()),
        }
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// Agent that records invocations, with optional delay and scripted failure.
pub(crate) struct MockAgent {
    pub calls: Arc<Mutex<Vec<(Vec<FileRef>, String)>>>,
    pub delay: std::time::Duration,
    pub fail_with: Option<String>,
    pub artifact: Option<String>,
}

impl MockAgent {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: std::time::Duration::ZERO,
            fail_with: None,
            artifact: Some("https://example.com/out.xlsx".to_string()),
        }
    }
}

#[async_trait]
impl ProcessingAgent for MockAgent {
    fn name(&self) -> &str {
        "mock"
    }

    async fn run(&self, files: &[FileRef], instruction: &str) -> Result<AgentOutput, VigiaError> {
        self.calls
            .lock()
            .unwrap()
            .push((files.to_vec(), instruction.to_string()));
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.fail_with {
            Some(reason) => Err(VigiaError::Agent(reason.clone())),
            None => Ok(AgentOutput {
                artifact_location: self.artifact.clone(),
            }),
        }
    }

    async fn is_available(&self) -> bool {
        true
    }
}

/// In-memory store with migrations applied.
pub(crate) async fn test_store() -> Store {
    Store::new(&MemoryConfig {
        db_path: ":memory:".to_string(),
    })
    .await
    .unwrap()
}

/// Gateway wired to mocks, plus handles on everything the tests assert on.
pub(crate) struct TestHarness {
    pub gateway: Arc<Gateway>,
    pub sent: Arc<Mutex<Vec<OutgoingMessage>>>,
    pub agent_calls: Arc<Mutex<Vec<(Vec<FileRef>, String)>>>,
    pub browser: Arc<MockBrowser>,
    pub store: Store,
}

impl TestHarness {
    /// Register a client with an active subscription.
    pub async fn register_client(&self, chat_id: &str) {
        let expires_on = chrono::Local::now().date_naive() + chrono::Days::new(30);
        self.store
            .ensure_client(chat_id, "folder-1", expires_on)
            .await
            .unwrap();
    }

    /// Put a detected-but-unconfirmed batch directly into a client's slot.
    pub async fn seed_pending_files(&self, chat_id: &str, files: Vec<FileRef>) {
        self.register_client(chat_id).await;
        let state = self.gateway.registry.get_or_create(chat_id);
        let mut slot = state.lock_hydrated(&self.store).await.unwrap();
        slot.pending = Pending::Detected { files };
    }

    /// Append a batch to a client's queue.
    pub async fn queue_batch(&self, chat_id: &str, files: Vec<FileRef>) {
        let state = self.gateway.registry.get_or_create(chat_id);
        let mut slot = state.lock().await;
        slot.queued.push_back(files);
    }
}

pub(crate) async fn harness() -> TestHarness {
    harness_with(MockAgent::new()).await
}

pub(crate) async fn harness_with(agent: MockAgent) -> TestHarness {
    harness_custom(agent, |_| {}).await
}

pub(crate) async fn harness_custom(
    agent: MockAgent,
    tweak: impl FnOnce(&mut Config),
) -> TestHarness {
    let store = test_store().await;
    let channel = Arc::new(MockChannel::new());
    let sent = channel.sent.clone();
    let browser = Arc::new(MockBrowser::new());
    let agent_calls = agent.calls.clone();

    let mut config = Config::default();
    config.storage.default_folder_id = "folder-default".to_string();
    tweak(&mut config);

    let gateway = Arc::new(Gateway::new(
        channel,
        browser.clone(),
        Arc::new(agent),
        store.clone(),
        &config,
    ));

    TestHarness {
        gateway,
        sent,
        agent_calls,
        browser,
        store,
    }
}

/// Build an inbound operator message.
pub(crate) fn incoming(chat_id: &str, text: &str) -> IncomingMessage {
    IncomingMessage {
        id: Uuid::new_v4(),
        chat_id: chat_id.to_string(),
        text: text.to_string(),
        timestamp: chrono::Utc::now(),
    }
}
