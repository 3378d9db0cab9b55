//! Runtime adapter that drives the agent CLI binary over stdio
//!
//! The binary is started in server mode and spoken to with framed JSON-RPC.
//! One reader task per process routes responses to waiting callers, session
//! events to per-session subscriber channels, and tool-call requests to the
//! tool registry.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::rpc::{self, Incoming};
use super::{AuthMode, ClientOptions, RuntimeClient, RuntimeConnector, RuntimeSession};
use crate::agents::domain::{AgentEvent, ResumeSessionConfig, SessionConfig};
use crate::agents::error::{AgentError, Result};
use crate::tools::ToolRegistry;

type PendingReply = oneshot::Sender<std::result::Result<Value, String>>;

/// Creates [`CliClient`]s that answer tool calls from a shared registry
pub struct CliConnector {
    tools: Arc<ToolRegistry>,
}

impl CliConnector {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }
}

impl RuntimeConnector for CliConnector {
    fn create(&self, options: &ClientOptions) -> Arc<dyn RuntimeClient> {
        Arc::new(CliClient::new(options.clone(), self.tools.clone()))
    }
}

/// State shared between the client, its sessions, and the reader task
struct Connection {
    writer: Mutex<Option<ChildStdin>>,
    next_id: AtomicU64,
    pending: StdMutex<HashMap<u64, PendingReply>>,
    subscribers: StdMutex<HashMap<String, Vec<mpsc::Sender<AgentEvent>>>>,
    alive: AtomicBool,
}

impl Connection {
    fn new() -> Self {
        Self {
            writer: Mutex::new(None),
            next_id: AtomicU64::new(1),
            pending: StdMutex::new(HashMap::new()),
            subscribers: StdMutex::new(HashMap::new()),
            alive: AtomicBool::new(false),
        }
    }

    async fn write(&self, message: &Value) -> Result<()> {
        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(stdin) => rpc::write_frame(stdin, message).await,
            None => Err(AgentError::Transport("runtime is not running".to_string())),
        }
    }

    /// Send a request and wait for its response
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        if !self.alive.load(Ordering::SeqCst) {
            return Err(AgentError::Transport("runtime is not running".to_string()));
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.lock_pending().insert(id, tx);

        if let Err(e) = self.write(&rpc::request(id, method, params)).await {
            self.lock_pending().remove(&id);
            return Err(e);
        }

        match rx.await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(message)) => Err(AgentError::Runtime(message)),
            Err(_) => Err(AgentError::Transport(format!(
                "runtime exited before answering {}",
                method
            ))),
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<u64, PendingReply>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_subscribers(
        &self,
    ) -> std::sync::MutexGuard<'_, HashMap<String, Vec<mpsc::Sender<AgentEvent>>>> {
        self.subscribers.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn subscribe(&self, session_id: &str, buffer: usize) -> mpsc::Receiver<AgentEvent> {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let mut subscribers = self.lock_subscribers();
        subscribers.retain(|_, list| {
            list.retain(|s| !s.is_closed());
            !list.is_empty()
        });
        subscribers.entry(session_id.to_string()).or_default().push(tx);
        rx
    }

    /// Deliver an event to every live subscriber of its session
    ///
    /// Runs on the reader task, so it never waits for channel capacity. A
    /// subscriber whose buffer is full is dropped; its receiver then sees the
    /// channel close.
    fn dispatch(&self, session_id: &str, event: AgentEvent) {
        let mut subscribers = self.lock_subscribers();
        let Some(list) = subscribers.get_mut(session_id) else {
            return;
        };

        list.retain(|sender| match sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(session_id = %session_id, "Subscriber is not keeping up; dropping it");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
        if list.is_empty() {
            subscribers.remove(session_id);
        }
    }

    /// Fail everything in flight once the process is gone
    fn shut(&self) {
        self.alive.store(false, Ordering::SeqCst);
        for (_, reply) in self.lock_pending().drain() {
            let _ = reply.send(Err("runtime process exited".to_string()));
        }
        self.lock_subscribers().clear();
    }
}

/// A started (or startable) runtime process
pub struct CliClient {
    options: ClientOptions,
    tools: Arc<ToolRegistry>,
    connection: Arc<Connection>,
    started: AtomicBool,
    child: Mutex<Option<Child>>,
    tasks: StdMutex<Vec<JoinHandle<()>>>,
}

impl CliClient {
    pub fn new(options: ClientOptions, tools: Arc<ToolRegistry>) -> Self {
        Self {
            options,
            tools,
            connection: Arc::new(Connection::new()),
            started: AtomicBool::new(false),
            child: Mutex::new(None),
            tasks: StdMutex::new(Vec::new()),
        }
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.options.cli_path);
        command
            .args(["--server", "--log-level", &self.options.log_level, "--stdio"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.options.working_dir {
            command.current_dir(dir);
        }
        if let AuthMode::Token {
            github_token: Some(token),
        } = &self.options.auth
        {
            command.env("GITHUB_TOKEN", token.expose_secret());
        }
        command
    }

    fn track(&self, handle: JoinHandle<()>) {
        self.tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(handle);
    }

    fn spawn_reader(&self, stdout: ChildStdout) -> JoinHandle<()> {
        let connection = self.connection.clone();
        let tools = self.tools.clone();

        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            loop {
                let message = match rpc::read_frame(&mut reader).await {
                    Ok(Some(message)) => message,
                    Ok(None) => {
                        info!("Runtime closed its output stream");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read from runtime");
                        break;
                    }
                };

                match Incoming::classify(message) {
                    Some(Incoming::Response { id, outcome }) => {
                        if let Some(reply) = connection.lock_pending().remove(&id) {
                            let _ = reply.send(outcome);
                        }
                    }
                    Some(Incoming::Notification { method, params }) => {
                        route_notification(&connection, &method, params);
                    }
                    Some(Incoming::Request { id, method, params }) => {
                        let connection = connection.clone();
                        let tools = tools.clone();
                        tokio::spawn(async move {
                            answer_request(&connection, &tools, id, &method, params).await;
                        });
                    }
                    None => debug!("Ignoring malformed runtime message"),
                }
            }
            connection.shut();
        })
    }
}

fn route_notification(connection: &Connection, method: &str, params: Value) {
    if method != "session.event" {
        debug!(method = %method, "Ignoring runtime notification");
        return;
    }

    let Some(session_id) = params.get("sessionId").and_then(Value::as_str) else {
        warn!("session.event without sessionId");
        return;
    };

    match serde_json::from_value::<AgentEvent>(params.get("event").cloned().unwrap_or(Value::Null)) {
        Ok(event) => connection.dispatch(session_id, event),
        Err(e) => warn!(session_id = %session_id, error = %e, "Undecodable session event"),
    }
}

async fn answer_request(
    connection: &Connection,
    tools: &ToolRegistry,
    id: Value,
    method: &str,
    params: Value,
) {
    let reply = match method {
        "tool.call" => {
            let name = params.get("toolName").and_then(Value::as_str).unwrap_or_default();
            let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
            debug!(
                tool = %name,
                tool_call_id = ?params.get("toolCallId"),
                "Runtime requested tool call"
            );

            let result = match tools.invoke(name, arguments).await {
                Ok(text) => json!({ "textResultForLlm": text, "resultType": "success" }),
                Err(e) => {
                    warn!(tool = %name, error = %e, "Tool call failed");
                    json!({
                        "textResultForLlm": e.to_string(),
                        "resultType": "failure",
                        "error": e.to_string()
                    })
                }
            };
            rpc::response(id, json!({ "result": result }))
        }
        other => rpc::error_response(id, -32601, &format!("Method not found: {}", other)),
    };

    if let Err(e) = connection.write(&reply).await {
        warn!(error = %e, "Failed to answer runtime request");
    }
}

#[async_trait]
impl RuntimeClient for CliClient {
    async fn start(&self) -> Result<()> {
        if self.is_started() {
            return Ok(());
        }

        let mut child = self.command().spawn().map_err(|e| {
            AgentError::Startup(format!("failed to launch '{}': {}", self.options.cli_path, e))
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (Some(stdin), Some(stdout)) = (stdin, stdout) else {
            return Err(AgentError::Startup("runtime stdio was not captured".to_string()));
        };

        *self.connection.writer.lock().await = Some(stdin);
        self.connection.alive.store(true, Ordering::SeqCst);
        self.track(self.spawn_reader(stdout));

        if let Some(stderr) = stderr {
            self.track(tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "agentfn::runtime", "{}", line);
                }
            }));
        }

        *self.child.lock().await = Some(child);

        if let Err(e) = self.connection.call("ping", json!({})).await {
            self.stop().await.ok();
            return Err(AgentError::Startup(format!("runtime handshake failed: {}", e)));
        }

        self.started.store(true, Ordering::SeqCst);
        info!(cli_path = %self.options.cli_path, auth = self.options.auth.label(), "Runtime started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.started.store(false, Ordering::SeqCst);
        self.connection.writer.lock().await.take();

        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to kill runtime process");
            }
        }

        for task in self.tasks.lock().unwrap_or_else(|e| e.into_inner()).drain(..) {
            task.abort();
        }
        self.connection.shut();
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst) && self.connection.alive.load(Ordering::SeqCst)
    }

    async fn create_session(&self, config: SessionConfig) -> Result<Arc<dyn RuntimeSession>> {
        let result = self
            .connection
            .call("session.create", serde_json::to_value(&config)?)
            .await
            .map_err(|e| AgentError::Create(e.to_string()))?;

        let session_id = result
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::Create("runtime returned no sessionId".to_string()))?;

        Ok(Arc::new(CliSession {
            id: session_id.to_string(),
            connection: self.connection.clone(),
        }))
    }

    async fn resume_session(
        &self,
        session_id: &str,
        config: ResumeSessionConfig,
    ) -> Result<Arc<dyn RuntimeSession>> {
        let mut params = serde_json::to_value(&config)?;
        if let Value::Object(map) = &mut params {
            map.insert("sessionId".to_string(), json!(session_id));
        }

        let result = self
            .connection
            .call("session.resume", params)
            .await
            .map_err(|e| AgentError::Resume {
                session_id: session_id.to_string(),
                message: e.to_string(),
            })?;

        let resumed_id = result
            .get("sessionId")
            .and_then(Value::as_str)
            .unwrap_or(session_id);

        Ok(Arc::new(CliSession {
            id: resumed_id.to_string(),
            connection: self.connection.clone(),
        }))
    }
}

/// Session handle backed by the shared stdio connection
struct CliSession {
    id: String,
    connection: Arc<Connection>,
}

#[async_trait]
impl RuntimeSession for CliSession {
    fn session_id(&self) -> &str {
        &self.id
    }

    fn subscribe(&self, buffer: usize) -> mpsc::Receiver<AgentEvent> {
        self.connection.subscribe(&self.id, buffer)
    }

    async fn send(&self, prompt: &str) -> Result<()> {
        self.connection
            .call("session.send", json!({ "sessionId": self.id, "prompt": prompt }))
            .await
            .map(|_| ())
    }

    async fn destroy(&self) -> Result<()> {
        let result = self
            .connection
            .call("session.destroy", json!({ "sessionId": self.id }))
            .await;
        self.connection.lock_subscribers().remove(&self.id);
        result.map(|_| ())
    }
}
