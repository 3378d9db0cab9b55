//! RMCP Server Adapter
//!
//! Exposes the chat capability as a single MCP tool, `chat`, over the rmcp
//! streamable HTTP transport. Tool arguments are normalised into the trigger
//! context `{"arguments": {"prompt": ...}, "sessionId": ...}` and the reply
//! carries the same JSON shape as `POST /agent/chat`.

use std::sync::Arc;

use rmcp::{
    handler::server::ServerHandler,
    model::{
        CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    ErrorData as McpError, RoleServer,
};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::adapters::chat_handler::{ChatError, ChatResponse, MISSING_PROMPT};
use crate::agents::{RunRequest, SessionRunner};

pub const CHAT_TOOL: &str = "chat";

#[derive(Clone)]
pub struct AgentFnServer {
    runner: Arc<SessionRunner>,
}

impl AgentFnServer {
    pub fn new(runner: Arc<SessionRunner>) -> Self {
        Self { runner }
    }

    fn chat_tool() -> Tool {
        let mut schema = Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert(
            "properties".to_string(),
            json!({
                "prompt": {
                    "type": "string",
                    "description": "The prompt to send to the agent"
                },
                "session_id": {
                    "type": "string",
                    "description": "Optional session ID to continue a previous conversation"
                }
            }),
        );
        schema.insert("required".to_string(), json!(["prompt"]));

        Tool::new(
            CHAT_TOOL,
            "Send a prompt to the agent and return its response",
            schema,
        )
    }
}

/// Build the trigger context from raw tool arguments
pub fn trigger_context(arguments: &Value) -> Value {
    let mut context = json!({
        "arguments": {
            "prompt": arguments.get("prompt").cloned().unwrap_or(Value::Null)
        }
    });
    if let Some(session_id) = arguments
        .get("session_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        context["sessionId"] = json!(session_id);
    }
    context
}

/// Run a trigger context; returns the reply payload and whether it is an error
pub async fn handle_trigger(runner: &SessionRunner, context: &Value) -> (Value, bool) {
    let prompt = context
        .pointer("/arguments/prompt")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty());
    let Some(prompt) = prompt else {
        tracing::warn!("MCP chat call without a prompt");
        return (json!({ "error": MISSING_PROMPT }), true);
    };

    let session_id = context
        .get("sessionId")
        .and_then(Value::as_str)
        .map(str::to_string);

    match runner
        .run(RunRequest::new(prompt).with_session_id(session_id))
        .await
    {
        Ok(result) => match serde_json::to_value(ChatResponse::from(result)) {
            Ok(payload) => (payload, false),
            Err(e) => (ChatError::internal(e.to_string()).body(), true),
        },
        Err(e) => {
            tracing::error!(error = %e, "MCP chat call failed");
            (ChatError::from(e).body(), true)
        }
    }
}

impl ServerHandler for AgentFnServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "agentfn".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                website_url: None,
                icons: None,
            },
            instructions: Some(
                "Chat with the hosted agent. Pass session_id to continue a conversation."
                    .to_string(),
            ),
        }
    }

    fn ping(
        &self,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<(), McpError>> + Send + '_ {
        async move {
            info!("MCP ping received");
            Ok(())
        }
    }

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            Ok(ListToolsResult {
                tools: vec![Self::chat_tool()],
                next_cursor: None,
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        let runner = self.runner.clone();
        async move {
            if request.name.as_ref() != CHAT_TOOL {
                return Err(McpError::invalid_params(
                    format!("Unknown tool: {}", request.name),
                    None,
                ));
            }

            let args = request
                .arguments
                .map(Value::Object)
                .unwrap_or(Value::Null);
            let context = trigger_context(&args);

            let (payload, is_error) = handle_trigger(&runner, &context).await;
            let content = vec![Content::text(payload.to_string())];
            Ok(if is_error {
                CallToolResult::error(content)
            } else {
                CallToolResult::success(content)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_context() {
        assert_eq!(
            trigger_context(&json!({"prompt": "hi", "session_id": "s1"})),
            json!({"arguments": {"prompt": "hi"}, "sessionId": "s1"})
        );
        assert_eq!(
            trigger_context(&json!({"prompt": "hi", "session_id": ""})),
            json!({"arguments": {"prompt": "hi"}})
        );
        assert_eq!(
            trigger_context(&Value::Null),
            json!({"arguments": {"prompt": null}})
        );
    }

    #[test]
    fn test_chat_tool_schema() {
        let tool = AgentFnServer::chat_tool();
        assert_eq!(tool.name, CHAT_TOOL);
        assert_eq!(tool.input_schema.get("required"), Some(&json!(["prompt"])));
    }
}
