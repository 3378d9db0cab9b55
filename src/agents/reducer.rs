//! Folds a buffered run's events into an `AgentResult`

use crate::agents::domain::{
    AgentEvent, AgentResult, EventKind, ToolCallRecord, INTERMEDIATE_WINDOW,
};

/// Accumulator for one buffered run
#[derive(Debug, Default)]
pub struct EventReducer {
    streaming: bool,
    messages: Vec<String>,
    reasoning: Vec<String>,
    tool_calls: Vec<ToolCallRecord>,
    events: Vec<AgentEvent>,
}

impl EventReducer {
    /// `streaming` enables delta and reasoning-delta accumulation. Message
    /// deltas join the same list as full messages.
    pub fn new(streaming: bool) -> Self {
        Self {
            streaming,
            ..Default::default()
        }
    }

    /// Record one event. Returns `true` once the session went idle.
    pub fn apply(&mut self, event: AgentEvent) -> bool {
        let idle = match event.kind() {
            EventKind::AssistantMessage => {
                if let Some(content) = event.content() {
                    self.messages.push(content.to_string());
                }
                false
            }
            EventKind::AssistantMessageDelta if self.streaming => {
                if let Some(delta) = event.delta_content() {
                    self.messages.push(delta.to_string());
                }
                false
            }
            EventKind::AssistantReasoningDelta if self.streaming => {
                if let Some(delta) = event.delta_content() {
                    self.reasoning.push(delta.to_string());
                }
                false
            }
            EventKind::ToolExecutionStart => {
                self.tool_calls.push(ToolCallRecord::from_event(&event));
                false
            }
            EventKind::SessionIdle => true,
            _ => false,
        };
        self.events.push(event);
        idle
    }

    /// Build the result for `session_id`
    pub fn finish(self, session_id: impl Into<String>) -> AgentResult {
        let mut messages = self.messages;
        let content = messages.pop().unwrap_or_default();
        let start = messages.len().saturating_sub(INTERMEDIATE_WINDOW);
        let content_intermediate = messages.split_off(start);

        let reasoning = if self.reasoning.is_empty() {
            None
        } else {
            Some(self.reasoning.concat())
        };

        AgentResult {
            session_id: session_id.into(),
            content,
            content_intermediate,
            tool_calls: self.tool_calls,
            reasoning,
            events: self.events,
        }
    }
}
