//! # agentfn - agent runtime behind HTTP, SSE, MCP and timers
//!
//! agentfn hosts a conversational agent runtime (an external CLI spoken to
//! over stdio JSON-RPC) and exposes it through:
//!
//! - `POST /agent/chat`: buffered chat
//! - `POST /agent/chat/stream`: Server-Sent Events chat
//! - `/mcp`: a streamable HTTP MCP server with a `chat` tool
//! - timer triggers declared in the `AGENTS.md` front matter
//!
//! ## Architecture
//!
//! - **Agents**: client singleton, session runner, event reduction, streaming bridge
//! - **Tools**: demonstration tools the agent may call back into
//! - **Adapters**: HTTP and MCP handlers
//! - **Config**: settings, `AGENTS.md`, MCP server and skills discovery
//! - **Scheduler**: cron timers

pub mod adapters;
pub mod agents;
pub mod cli;
pub mod config;
pub mod scheduler;
pub mod tools;

use crate::adapters::chat_handler;
use crate::adapters::health_handler::HealthHandler;
use crate::adapters::rmcp_server::AgentFnServer;
use crate::adapters::ui_handler::UIHandler;
use crate::adapters::AppState;
use crate::agents::SessionRunner;
use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use std::sync::Arc;

/// Creates the Axum application router with all endpoints configured.
///
/// `GET /` serves the bundled chat page; every other unmatched path is a
/// plain-text 404.
pub fn create_app(runner: Arc<SessionRunner>) -> Router {
    let health = Arc::new(HealthHandler::new(runner.clients().clone()));

    // rmcp HTTP transport service
    let server = AgentFnServer::new(runner.clone());
    let mcp_service = StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    );

    let state = AppState { runner, health };

    Router::new()
        .route(
            "/health",
            get(|State(state): State<AppState>| async move { state.health.health().await }),
        )
        .route("/agent/chat", post(chat_handler::chat))
        .route("/agent/chat/stream", post(chat_handler::chat_stream))
        .with_state(state)
        .nest_service("/mcp", mcp_service)
        .fallback(UIHandler::serve)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any)
                .expose_headers([axum::http::HeaderName::from_static(
                    chat_handler::SESSION_HEADER,
                )]),
        )
}
