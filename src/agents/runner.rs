//! Runs prompts against runtime sessions
//!
//! A run resolves its session (resume when the caller's id has state on
//! disk, create otherwise), subscribes before sending, and then either
//! buffers events into an [`AgentResult`] or hands them to the streaming
//! bridge.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};

use crate::agents::bridge::bridge;
use crate::agents::client_manager::ClientManager;
use crate::agents::domain::{
    AgentResult, EventKind, McpServerSpec, ProviderConfig, ResumeSessionConfig, ServerEventStream,
    SessionConfig, SystemMessage, ToolSpec,
};
use crate::agents::error::{AgentError, Result};
use crate::agents::reducer::EventReducer;
use crate::agents::runtime::{AuthMode, RuntimeClient, RuntimeSession};
use crate::config::session_exists;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Session-level settings shared by every run
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub model: String,
    pub timeout: Duration,
    /// Capacity of each run's event subscription
    pub event_buffer: usize,
    /// Where the runtime keeps session state; `None` means its default
    pub config_dir: Option<PathBuf>,
    /// Skills root handed to newly created sessions
    pub session_directory: Option<PathBuf>,
    /// System message body (replaces the runtime's default)
    pub system_message: String,
    pub mcp_servers: BTreeMap<String, McpServerSpec>,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4".to_string(),
            timeout: DEFAULT_TIMEOUT,
            event_buffer: DEFAULT_EVENT_BUFFER,
            config_dir: None,
            session_directory: None,
            system_message: String::new(),
            mcp_servers: BTreeMap::new(),
        }
    }
}

/// One prompt, optionally continuing an earlier session
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub prompt: String,
    pub session_id: Option<String>,
}

impl RunRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            session_id: None,
        }
    }

    pub fn with_session_id(mut self, session_id: Option<String>) -> Self {
        self.session_id = session_id.filter(|s| !s.trim().is_empty());
        self
    }
}

pub struct SessionRunner {
    clients: Arc<ClientManager>,
    tools: Vec<ToolSpec>,
    settings: RunnerSettings,
}

impl SessionRunner {
    pub fn new(clients: Arc<ClientManager>, tools: Vec<ToolSpec>, settings: RunnerSettings) -> Self {
        Self {
            clients,
            tools,
            settings,
        }
    }

    pub fn settings(&self) -> &RunnerSettings {
        &self.settings
    }

    pub fn clients(&self) -> &Arc<ClientManager> {
        &self.clients
    }

    fn auth(&self) -> &AuthMode {
        &self.clients.options().auth
    }

    fn system_message(&self) -> SystemMessage {
        SystemMessage::replace(self.settings.system_message.clone())
    }

    /// Create config for a new session, including BYOK provider and skills root
    pub fn session_config(&self, session_id: Option<&str>, streaming: bool) -> SessionConfig {
        let mut model = self.settings.model.clone();
        let provider = match self.auth() {
            AuthMode::Byok(byok) => {
                if let Some(byok_model) = &byok.model {
                    model = byok_model.clone();
                }
                let provider =
                    ProviderConfig::openai_compatible(byok.endpoint.clone(), byok.api_key.clone(), &model);
                tracing::info!(
                    endpoint = %byok.endpoint,
                    model = %model,
                    wire_api = %provider.wire_api,
                    "Using BYOK provider"
                );
                Some(provider)
            }
            AuthMode::Token { .. } => None,
        };

        SessionConfig {
            model,
            streaming,
            tools: self.tools.clone(),
            system_message: self.system_message(),
            session_id: session_id.map(str::to_string),
            config_dir: self.settings.config_dir.clone(),
            mcp_servers: self.settings.mcp_servers.clone(),
            session_directory: self.settings.session_directory.clone(),
            provider,
        }
    }

    pub fn resume_config(&self, streaming: bool) -> ResumeSessionConfig {
        ResumeSessionConfig {
            model: self.settings.model.clone(),
            streaming,
            tools: self.tools.clone(),
            system_message: self.system_message(),
            config_dir: self.settings.config_dir.clone(),
            mcp_servers: self.settings.mcp_servers.clone(),
        }
    }

    /// Resume when `session_id` has state on disk, create otherwise
    ///
    /// A failed resume is reported as is; it never falls back to create.
    pub async fn resolve_session(
        &self,
        client: &dyn RuntimeClient,
        session_id: Option<&str>,
        streaming: bool,
    ) -> Result<Arc<dyn RuntimeSession>> {
        if let Some(id) = session_id {
            if session_exists(self.settings.config_dir.as_deref(), id) {
                tracing::info!(session_id = %id, streaming, "Resuming existing session");
                return client.resume_session(id, self.resume_config(streaming)).await;
            }
            tracing::info!(session_id = %id, streaming, "Creating new session with provided id");
        }

        let session = client
            .create_session(self.session_config(session_id, streaming))
            .await?;
        tracing::info!(session_id = %session.session_id(), streaming, "Created session");
        Ok(session)
    }

    /// Buffered run: send the prompt and wait for the session to go idle
    pub async fn run(&self, request: RunRequest) -> Result<AgentResult> {
        self.run_buffered(request, false).await
    }

    /// Buffered run on a session opened with `streaming`, which also makes
    /// the reducer collect message deltas alongside full messages and join
    /// reasoning deltas
    pub async fn run_buffered(&self, request: RunRequest, streaming: bool) -> Result<AgentResult> {
        validate_prompt(&request.prompt)?;

        let client = self.clients.get_client().await?;
        let session = self
            .resolve_session(client.as_ref(), request.session_id.as_deref(), streaming)
            .await?;
        let session_id = session.session_id().to_string();

        let mut events = session.subscribe(self.settings.event_buffer);
        session.send(&request.prompt).await?;

        let deadline = Instant::now() + self.settings.timeout;
        let mut reducer = EventReducer::new(streaming);

        loop {
            match timeout_at(deadline, events.recv()).await {
                Err(_) => {
                    tracing::warn!(
                        session_id = %session_id,
                        timeout_secs = self.settings.timeout.as_secs(),
                        "Run timed out before session.idle"
                    );
                    return Err(AgentError::Timeout(self.settings.timeout.as_secs()));
                }
                Ok(None) => {
                    return Err(AgentError::Runtime(format!(
                        "event channel for session {} closed before session.idle",
                        session_id
                    )))
                }
                Ok(Some(event)) if event.kind() == EventKind::SessionError => {
                    let message = event.error_message();
                    tracing::error!(session_id = %session_id, error = %message, "Session reported an error");
                    return Err(AgentError::Runtime(message));
                }
                Ok(Some(event)) => {
                    if reducer.apply(event) {
                        break;
                    }
                }
            }
        }

        let result = reducer.finish(session_id);
        tracing::info!(
            session_id = %result.session_id,
            tool_calls = result.tool_calls.len(),
            events = result.events.len(),
            "Run completed"
        );
        Ok(result)
    }

    /// Streaming run
    ///
    /// The session is resolved and subscribed before this returns, so
    /// start-up and resolution failures surface here rather than inside the
    /// stream. The returned stream sends the prompt once polled past its
    /// first item.
    pub async fn run_stream(&self, request: RunRequest) -> Result<(String, ServerEventStream)> {
        validate_prompt(&request.prompt)?;

        let client = self.clients.get_client().await?;
        let session = self
            .resolve_session(client.as_ref(), request.session_id.as_deref(), true)
            .await?;
        let session_id = session.session_id().to_string();
        let events = session.subscribe(self.settings.event_buffer);

        tracing::info!(session_id = %session_id, "Starting streaming run");
        Ok((
            session_id,
            bridge(session, events, request.prompt, self.settings.timeout),
        ))
    }
}

fn validate_prompt(prompt: &str) -> Result<()> {
    if prompt.is_empty() {
        return Err(AgentError::Validation("Missing 'prompt'".to_string()));
    }
    Ok(())
}
