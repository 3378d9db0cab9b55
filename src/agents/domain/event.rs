//! Session events emitted by the agent runtime

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A typed notification emitted by a runtime session
///
/// The payload is kept as raw JSON; accessors below pull the fields the
/// runner cares about without forcing a schema on every event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEvent {
    /// Event type, e.g. `assistant.message`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Runtime-assigned event id (may repeat on redelivery)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// When the runtime emitted the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Event payload
    #[serde(default)]
    pub data: Value,
}

/// Event types the runner reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    AssistantMessage,
    AssistantMessageDelta,
    AssistantReasoningDelta,
    ToolExecutionStart,
    ToolExecutionEnd,
    SessionIdle,
    SessionError,
    Other,
}

impl EventKind {
    pub fn from_type(event_type: &str) -> Self {
        match event_type {
            "assistant.message" => Self::AssistantMessage,
            "assistant.message_delta" => Self::AssistantMessageDelta,
            "assistant.reasoning_delta" => Self::AssistantReasoningDelta,
            "tool.execution_start" => Self::ToolExecutionStart,
            "tool.execution_end" => Self::ToolExecutionEnd,
            "session.idle" => Self::SessionIdle,
            "session.error" => Self::SessionError,
            _ => Self::Other,
        }
    }
}

impl AgentEvent {
    /// Create an event with a JSON payload
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            id: None,
            timestamp: None,
            data,
        }
    }

    /// Set the event id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn kind(&self) -> EventKind {
        EventKind::from_type(&self.event_type)
    }

    fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Full assistant message text (`assistant.message`)
    pub fn content(&self) -> Option<&str> {
        self.data_str("content")
    }

    /// Incremental text (`*_delta` events); empty deltas count as absent
    pub fn delta_content(&self) -> Option<&str> {
        self.data_str("deltaContent").filter(|s| !s.is_empty())
    }

    pub fn tool_call_id(&self) -> Option<&str> {
        self.data_str("toolCallId")
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.data_str("toolName")
    }

    pub fn parent_tool_call_id(&self) -> Option<&str> {
        self.data_str("parentToolCallId")
    }

    pub fn arguments(&self) -> Value {
        self.data.get("arguments").cloned().unwrap_or(Value::Null)
    }

    pub fn tool_result(&self) -> Value {
        self.data.get("result").cloned().unwrap_or(Value::Null)
    }

    /// Error text carried by `session.error`
    pub fn error_message(&self) -> String {
        self.data_str("message")
            .map(str::to_string)
            .unwrap_or_else(|| format!("session reported an error: {}", self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_runtime_event() {
        let event: AgentEvent = serde_json::from_value(json!({
            "type": "tool.execution_start",
            "id": "evt-1",
            "timestamp": "2025-01-02T03:04:05Z",
            "data": {
                "toolCallId": "call-1",
                "toolName": "calculator",
                "arguments": {"expression": "2+2"}
            }
        }))
        .unwrap();

        assert_eq!(event.kind(), EventKind::ToolExecutionStart);
        assert_eq!(event.id.as_deref(), Some("evt-1"));
        assert_eq!(event.tool_name(), Some("calculator"));
        assert_eq!(event.arguments()["expression"], "2+2");
        assert!(event.timestamp.is_some());
    }

    #[test]
    fn test_empty_delta_is_absent() {
        let event = AgentEvent::new("assistant.message_delta", json!({"deltaContent": ""}));
        assert_eq!(event.delta_content(), None);
    }

    #[test]
    fn test_unknown_type_is_other() {
        let event = AgentEvent::new("session.usage_info", Value::Null);
        assert_eq!(event.kind(), EventKind::Other);
    }
}
