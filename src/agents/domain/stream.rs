//! Outward-facing streaming events

use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AgentEvent;

/// Message sent when the streaming deadline expires
pub const STREAM_TIMEOUT_MESSAGE: &str = "Timeout waiting for response";

/// One item of a streaming run, rendered as an SSE `data:` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Always first: the session the caller can resume later
    Session { session_id: String },
    /// Assistant text increment
    Delta { content: String },
    /// Reasoning increment
    Intermediate { content: String },
    /// Full assistant message
    Message { content: String },
    ToolStart {
        event_id: Option<String>,
        timestamp: Option<String>,
        tool_name: Option<String>,
        tool_call_id: Option<String>,
        parent_tool_call_id: Option<String>,
        arguments: Value,
    },
    ToolEnd {
        event_id: Option<String>,
        timestamp: Option<String>,
        tool_name: Option<String>,
        tool_call_id: Option<String>,
        parent_tool_call_id: Option<String>,
        result: Value,
    },
    /// Terminal success
    Done,
    /// Terminal failure
    Error { content: String },
}

impl ServerEvent {
    /// Create an error item
    pub fn error(content: impl Into<String>) -> Self {
        Self::Error {
            content: content.into(),
        }
    }

    /// Whether the stream ends after this item
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error { .. })
    }

    /// Map a runtime event to its outward form.
    ///
    /// Returns `None` for events that are not forwarded (empty deltas,
    /// bookkeeping events, and the terminal events the bridge handles itself).
    pub fn from_agent_event(event: &AgentEvent) -> Option<Self> {
        use super::EventKind;

        let timestamp = || event.timestamp.map(|t| t.to_rfc3339());
        let owned = |s: Option<&str>| s.map(str::to_string);

        match event.kind() {
            EventKind::AssistantMessageDelta => event.delta_content().map(|d| Self::Delta {
                content: d.to_string(),
            }),
            EventKind::AssistantReasoningDelta => {
                event.delta_content().map(|d| Self::Intermediate {
                    content: d.to_string(),
                })
            }
            EventKind::AssistantMessage => Some(Self::Message {
                content: event.content().unwrap_or_default().to_string(),
            }),
            EventKind::ToolExecutionStart => Some(Self::ToolStart {
                event_id: event.id.clone(),
                timestamp: timestamp(),
                tool_name: owned(event.tool_name()),
                tool_call_id: owned(event.tool_call_id()),
                parent_tool_call_id: owned(event.parent_tool_call_id()),
                arguments: event.arguments(),
            }),
            EventKind::ToolExecutionEnd => Some(Self::ToolEnd {
                event_id: event.id.clone(),
                timestamp: timestamp(),
                tool_name: owned(event.tool_name()),
                tool_call_id: owned(event.tool_call_id()),
                parent_tool_call_id: owned(event.parent_tool_call_id()),
                result: event.tool_result(),
            }),
            EventKind::SessionIdle | EventKind::SessionError | EventKind::Other => None,
        }
    }
}

/// Lazy, non-restartable sequence of streaming items
pub type ServerEventStream = BoxStream<'static, ServerEvent>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let value = serde_json::to_value(ServerEvent::Session {
            session_id: "s1".to_string(),
        })
        .unwrap();
        assert_eq!(value, json!({"type": "session", "session_id": "s1"}));

        let value = serde_json::to_value(ServerEvent::Done).unwrap();
        assert_eq!(value, json!({"type": "done"}));

        let value = serde_json::to_value(ServerEvent::error(STREAM_TIMEOUT_MESSAGE)).unwrap();
        assert_eq!(
            value,
            json!({"type": "error", "content": "Timeout waiting for response"})
        );
    }

    #[test]
    fn test_reasoning_delta_maps_to_intermediate() {
        let event = AgentEvent::new(
            "assistant.reasoning_delta",
            json!({"deltaContent": "thinking"}),
        );
        assert_eq!(
            ServerEvent::from_agent_event(&event),
            Some(ServerEvent::Intermediate {
                content: "thinking".to_string()
            })
        );
    }

    #[test]
    fn test_idle_is_not_forwarded() {
        let event = AgentEvent::new("session.idle", Value::Null);
        assert_eq!(ServerEvent::from_agent_event(&event), None);
    }
}
