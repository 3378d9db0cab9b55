//! Aggregated output of a buffered run

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AgentEvent;

/// Number of earlier messages kept next to the final one
pub const INTERMEDIATE_WINDOW: usize = 5;

/// A tool invocation observed on the event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub event_id: Option<String>,
    pub timestamp: Option<String>,
    pub tool_call_id: Option<String>,
    pub tool_name: Option<String>,
    pub arguments: Value,
    pub parent_tool_call_id: Option<String>,
}

impl ToolCallRecord {
    /// Normalize a `tool.execution_start` event
    pub fn from_event(event: &AgentEvent) -> Self {
        Self {
            event_id: event.id.clone(),
            timestamp: event.timestamp.map(|t| t.to_rfc3339()),
            tool_call_id: event.tool_call_id().map(str::to_string),
            tool_name: event.tool_name().map(str::to_string),
            arguments: event.arguments(),
            parent_tool_call_id: event.parent_tool_call_id().map(str::to_string),
        }
    }
}

/// Final result of one buffered run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    /// Session the run executed in (pass back to resume)
    pub session_id: String,
    /// Last assistant message, or empty when none arrived
    pub content: String,
    /// Up to five messages preceding the last one, oldest first
    pub content_intermediate: Vec<String>,
    /// Tool calls in arrival order
    pub tool_calls: Vec<ToolCallRecord>,
    /// Concatenated reasoning deltas
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    /// Every event received, verbatim
    pub events: Vec<AgentEvent>,
}
