//! Chat endpoints
//!
//! `POST /agent/chat` answers with the buffered result; `POST
//! /agent/chat/stream` answers with Server-Sent Events. Both take
//! `{"prompt": "..."}` and an optional `x-ms-session-id` header naming the
//! session to continue.

use std::convert::Infallible;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::AppState;
use crate::agents::domain::{AgentResult, ServerEvent, ToolCallRecord};
use crate::agents::{AgentError, RunRequest};

pub const SESSION_HEADER: &str = "x-ms-session-id";
pub const MISSING_PROMPT: &str = "Missing 'prompt'";

/// Success body of `POST /agent/chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub response: String,
    pub response_intermediate: Vec<String>,
    pub tool_calls: Vec<ToolCallRecord>,
}

impl From<AgentResult> for ChatResponse {
    fn from(result: AgentResult) -> Self {
        Self {
            session_id: result.session_id,
            response: result.content,
            response_intermediate: result.content_intermediate,
            tool_calls: result.tool_calls,
        }
    }
}

/// Error reply rendered as `{"error": message}`
#[derive(Debug)]
pub struct ChatError {
    pub status: StatusCode,
    pub message: String,
}

impl ChatError {
    pub fn missing_prompt() -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: MISSING_PROMPT.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn body(&self) -> Value {
        json!({ "error": self.message })
    }
}

impl From<AgentError> for ChatError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Validation(_) => Self::missing_prompt(),
            other => Self::internal(other.to_string()),
        }
    }
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Chat request failed");
        } else {
            tracing::warn!(status = %self.status, error = %self.message, "Chat request rejected");
        }
        (self.status, Json(self.body())).into_response()
    }
}

/// Pull a non-empty string `prompt` out of a decoded body
pub fn extract_prompt(body: &Value) -> Result<String, ChatError> {
    if !body.is_object() {
        return Err(ChatError::internal("Request body must be a JSON object"));
    }
    body.get("prompt")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .ok_or_else(ChatError::missing_prompt)
}

fn parse_request(headers: &HeaderMap, body: &[u8]) -> Result<RunRequest, ChatError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ChatError::internal(format!("Invalid JSON body: {}", e)))?;
    let prompt = extract_prompt(&value)?;

    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    Ok(RunRequest::new(prompt).with_session_id(session_id))
}

fn with_session_header(mut response: Response, session_id: &str) -> Response {
    match HeaderValue::from_str(session_id) {
        Ok(value) => {
            response.headers_mut().insert(SESSION_HEADER, value);
        }
        Err(_) => tracing::warn!(session_id = %session_id, "Session id is not a valid header value"),
    }
    response
}

/// `POST /agent/chat`
pub async fn chat(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request = match parse_request(&headers, &body) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    match state.runner.run(request).await {
        Ok(result) => {
            let reply = ChatResponse::from(result);
            let session_id = reply.session_id.clone();
            with_session_header((StatusCode::OK, Json(reply)).into_response(), &session_id)
        }
        Err(e) => ChatError::from(e).into_response(),
    }
}

/// `POST /agent/chat/stream`
pub async fn chat_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = match parse_request(&headers, &body) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };

    let (session_id, stream) = match state.runner.run_stream(request).await {
        Ok(parts) => parts,
        Err(e) => return ChatError::from(e).into_response(),
    };

    let events = stream.map(|item: ServerEvent| {
        let event = Event::default().json_data(&item).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to encode stream item");
            Event::default().data(
                json!({"type": "error", "content": "failed to encode stream item"}).to_string(),
            )
        });
        Ok::<_, Infallible>(event)
    });

    let response = Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response();
    with_session_header(response, &session_id)
}
