//! In-memory runtime double shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agentfn::agents::domain::{AgentEvent, ResumeSessionConfig, SessionConfig};
use agentfn::agents::runtime::{
    AuthMode, ClientOptions, RuntimeClient, RuntimeConnector, RuntimeSession,
};
use agentfn::agents::{AgentError, ClientManager, RunnerSettings, SessionRunner};
use agentfn::tools::ToolRegistry;
use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;

/// Shared knobs and recordings of the fake runtime
#[derive(Default)]
pub struct FakeState {
    pub starts: AtomicUsize,
    pub stops: AtomicUsize,
    pub fail_start: AtomicBool,
    pub fail_resume: AtomicBool,
    /// Makes every live client report itself as stopped
    pub crashed: AtomicBool,
    pub created: Mutex<Vec<SessionConfig>>,
    pub resumed: Mutex<Vec<(String, ResumeSessionConfig)>>,
    pub prompts: Mutex<Vec<String>>,
    /// Delivered to a subscriber as soon as it subscribes
    pub early: Mutex<Vec<AgentEvent>>,
    /// Delivered to every subscriber after `send`
    pub script: Mutex<Vec<AgentEvent>>,
    next_session: AtomicUsize,
}

impl FakeState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_script(events: Vec<AgentEvent>) -> Arc<Self> {
        let state = Self::new();
        state.set_script(events);
        state
    }

    pub fn set_script(&self, events: Vec<AgentEvent>) {
        *self.script.lock().unwrap() = events;
    }

    pub fn set_early(&self, events: Vec<AgentEvent>) {
        *self.early.lock().unwrap() = events;
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

pub struct FakeConnector {
    pub state: Arc<FakeState>,
}

impl RuntimeConnector for FakeConnector {
    fn create(&self, _options: &ClientOptions) -> Arc<dyn RuntimeClient> {
        Arc::new(FakeClient {
            state: self.state.clone(),
            started: AtomicBool::new(false),
        })
    }
}

pub struct FakeClient {
    state: Arc<FakeState>,
    started: AtomicBool,
}

#[async_trait]
impl RuntimeClient for FakeClient {
    async fn start(&self) -> agentfn::agents::Result<()> {
        self.state.starts.fetch_add(1, Ordering::SeqCst);
        // Widen the window for concurrent callers
        tokio::time::sleep(Duration::from_millis(20)).await;
        if self.state.fail_start.load(Ordering::SeqCst) {
            return Err(AgentError::Startup("binary not found".to_string()));
        }
        self.state.crashed.store(false, Ordering::SeqCst);
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> agentfn::agents::Result<()> {
        self.state.stops.fetch_add(1, Ordering::SeqCst);
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst) && !self.state.crashed.load(Ordering::SeqCst)
    }

    async fn create_session(
        &self,
        config: SessionConfig,
    ) -> agentfn::agents::Result<Arc<dyn RuntimeSession>> {
        let id = config.session_id.clone().unwrap_or_else(|| {
            let n = self.state.next_session.fetch_add(1, Ordering::SeqCst) + 1;
            format!("session-{}", n)
        });
        self.state.created.lock().unwrap().push(config);
        Ok(Arc::new(FakeSession::new(id, self.state.clone())))
    }

    async fn resume_session(
        &self,
        session_id: &str,
        config: ResumeSessionConfig,
    ) -> agentfn::agents::Result<Arc<dyn RuntimeSession>> {
        if self.state.fail_resume.load(Ordering::SeqCst) {
            return Err(AgentError::Resume {
                session_id: session_id.to_string(),
                message: "session is corrupt".to_string(),
            });
        }
        self.state
            .resumed
            .lock()
            .unwrap()
            .push((session_id.to_string(), config));
        Ok(Arc::new(FakeSession::new(
            session_id.to_string(),
            self.state.clone(),
        )))
    }
}

pub struct FakeSession {
    id: String,
    state: Arc<FakeState>,
    subscribers: Mutex<Vec<mpsc::Sender<AgentEvent>>>,
}

impl FakeSession {
    fn new(id: String, state: Arc<FakeState>) -> Self {
        Self {
            id,
            state,
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RuntimeSession for FakeSession {
    fn session_id(&self) -> &str {
        &self.id
    }

    fn subscribe(&self, buffer: usize) -> mpsc::Receiver<AgentEvent> {
        let (tx, rx) = mpsc::channel(buffer);
        for event in self.state.early.lock().unwrap().iter() {
            let _ = tx.try_send(event.clone());
        }
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    async fn send(&self, prompt: &str) -> agentfn::agents::Result<()> {
        self.state.prompts.lock().unwrap().push(prompt.to_string());
        let script = self.state.script.lock().unwrap().clone();
        let subscribers = self.subscribers.lock().unwrap().clone();
        tokio::spawn(async move {
            for event in script {
                for tx in &subscribers {
                    let _ = tx.send(event.clone()).await;
                }
            }
            // Keep the channels open so a script without session.idle times out
            tokio::time::sleep(Duration::from_secs(60)).await;
            drop(subscribers);
        });
        Ok(())
    }

    async fn destroy(&self) -> agentfn::agents::Result<()> {
        Ok(())
    }
}

pub fn client_options() -> ClientOptions {
    ClientOptions {
        cli_path: "copilot".to_string(),
        auth: AuthMode::Token { github_token: None },
        working_dir: None,
        log_level: "info".to_string(),
    }
}

pub fn client_manager(state: &Arc<FakeState>) -> Arc<ClientManager> {
    Arc::new(ClientManager::new(
        Arc::new(FakeConnector {
            state: state.clone(),
        }),
        client_options(),
    ))
}

pub fn runner(state: &Arc<FakeState>, settings: RunnerSettings) -> Arc<SessionRunner> {
    Arc::new(SessionRunner::new(
        client_manager(state),
        ToolRegistry::builtin().specs(),
        settings,
    ))
}

pub fn quick_settings() -> RunnerSettings {
    RunnerSettings {
        timeout: Duration::from_millis(300),
        system_message: "You are a test agent.".to_string(),
        ..RunnerSettings::default()
    }
}

pub fn message(id: &str, text: &str) -> AgentEvent {
    AgentEvent::new("assistant.message", json!({ "content": text })).with_id(id)
}

pub fn delta(id: &str, text: &str) -> AgentEvent {
    AgentEvent::new("assistant.message_delta", json!({ "deltaContent": text })).with_id(id)
}

pub fn tool_start(id: &str, call_id: &str, name: &str) -> AgentEvent {
    AgentEvent::new(
        "tool.execution_start",
        json!({ "toolCallId": call_id, "toolName": name, "arguments": {"expression": "2+2"} }),
    )
    .with_id(id)
}

pub fn tool_end(id: &str, call_id: &str, name: &str) -> AgentEvent {
    AgentEvent::new(
        "tool.execution_end",
        json!({ "toolCallId": call_id, "toolName": name, "result": "4" }),
    )
    .with_id(id)
}

pub fn idle(id: &str) -> AgentEvent {
    AgentEvent::new("session.idle", json!({})).with_id(id)
}

pub fn session_error(id: &str, text: &str) -> AgentEvent {
    AgentEvent::new("session.error", json!({ "message": text })).with_id(id)
}

/// A config dir holding on-disk state for `session_id`
pub fn config_dir_with_session(session_id: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("session-state").join(session_id)).unwrap();
    dir
}
