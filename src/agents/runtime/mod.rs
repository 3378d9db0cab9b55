//! Ports to the external agent runtime
//!
//! The runtime owns orchestration, model calls, and session persistence.
//! This crate only starts it, opens sessions on it, and listens to what the
//! sessions emit. Everything goes through these traits so the runner can be
//! driven by the stdio adapter in production and by doubles in tests.

mod cli;
mod rpc;

pub use cli::{CliClient, CliConnector};

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::mpsc;

use crate::agents::domain::{AgentEvent, ResumeSessionConfig, SessionConfig};
use crate::agents::error::Result;

/// BYOK endpoint settings
#[derive(Debug, Clone)]
pub struct ByokSettings {
    pub endpoint: String,
    pub api_key: SecretString,
    /// Deployment model; falls back to the configured model
    pub model: Option<String>,
}

/// How the runtime authenticates against the model backend
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// Platform-issued token (or whatever the runtime has cached)
    Token { github_token: Option<SecretString> },
    /// Bring your own key: sessions carry an explicit provider
    Byok(ByokSettings),
}

impl AuthMode {
    /// BYOK only when both the endpoint and key are present and non-empty
    pub fn resolve(
        github_token: Option<String>,
        endpoint: Option<String>,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        match (non_empty(endpoint), non_empty(api_key)) {
            (Some(endpoint), Some(api_key)) => AuthMode::Byok(ByokSettings {
                endpoint,
                api_key: SecretString::from(api_key),
                model: non_empty(model),
            }),
            _ => AuthMode::Token {
                github_token: non_empty(github_token).map(SecretString::from),
            },
        }
    }

    pub fn is_byok(&self) -> bool {
        matches!(self, AuthMode::Byok(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuthMode::Token { .. } => "token",
            AuthMode::Byok(_) => "byok",
        }
    }
}

/// Everything needed to construct a runtime client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Path (or bare command name) of the runtime binary
    pub cli_path: String,
    pub auth: AuthMode,
    /// Working directory for the runtime process
    pub working_dir: Option<PathBuf>,
    /// Log level passed to the runtime
    pub log_level: String,
}

/// Builds runtime clients; one call per (re)start
pub trait RuntimeConnector: Send + Sync {
    fn create(&self, options: &ClientOptions) -> Arc<dyn RuntimeClient>;
}

/// A connection to one runtime process
#[async_trait]
pub trait RuntimeClient: Send + Sync {
    /// Start the process and complete the handshake
    async fn start(&self) -> Result<()>;

    /// Stop the process; idempotent
    async fn stop(&self) -> Result<()>;

    /// Whether `start` succeeded and the connection is still usable
    fn is_started(&self) -> bool;

    async fn create_session(&self, config: SessionConfig) -> Result<Arc<dyn RuntimeSession>>;

    async fn resume_session(
        &self,
        session_id: &str,
        config: ResumeSessionConfig,
    ) -> Result<Arc<dyn RuntimeSession>>;
}

/// A conversational context held by the runtime
#[async_trait]
pub trait RuntimeSession: Send + Sync {
    /// Opaque id assigned by the runtime, stable across resume
    fn session_id(&self) -> &str;

    /// Open a bounded channel carrying every event of this session from now
    /// on, in arrival order. Dropping the receiver ends the subscription.
    fn subscribe(&self, buffer: usize) -> mpsc::Receiver<AgentEvent>;

    /// Queue a prompt; returns once the runtime accepted it
    async fn send(&self, prompt: &str) -> Result<()>;

    /// Release the session on the runtime side
    async fn destroy(&self) -> Result<()>;
}
