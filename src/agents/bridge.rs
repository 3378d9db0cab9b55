//! Turns a session subscription into a stream of `ServerEvent`s
//!
//! The bridge is an explicit state machine driven by `futures::stream::unfold`:
//!
//! ```text
//! AwaitSessionId -> Sending -> Streaming -> Finished
//! ```
//!
//! The session id is yielded before the prompt is sent. Right before sending,
//! anything already queued on the subscription is discarded, so the caller
//! only ever sees events caused by this prompt. Event ids are deduplicated
//! and a single deadline bounds the whole response.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};

use crate::agents::domain::{
    AgentEvent, EventKind, ServerEvent, ServerEventStream, STREAM_TIMEOUT_MESSAGE,
};
use crate::agents::runtime::RuntimeSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    AwaitSessionId,
    Sending,
    Streaming { deadline: Instant },
    Finished,
}

struct Bridge {
    session: Arc<dyn RuntimeSession>,
    events: mpsc::Receiver<AgentEvent>,
    prompt: String,
    timeout: Duration,
    seen: HashSet<String>,
    phase: Phase,
}

/// Build the lazy stream for one prompt on an already subscribed session
pub(crate) fn bridge(
    session: Arc<dyn RuntimeSession>,
    events: mpsc::Receiver<AgentEvent>,
    prompt: String,
    timeout: Duration,
) -> ServerEventStream {
    let state = Bridge {
        session,
        events,
        prompt,
        timeout,
        seen: HashSet::new(),
        phase: Phase::AwaitSessionId,
    };

    stream::unfold(state, |mut state| async move {
        let item = state.next_item().await?;
        Some((item, state))
    })
    .boxed()
}

impl Bridge {
    async fn next_item(&mut self) -> Option<ServerEvent> {
        loop {
            match self.phase {
                Phase::AwaitSessionId => {
                    self.phase = Phase::Sending;
                    return Some(ServerEvent::Session {
                        session_id: self.session.session_id().to_string(),
                    });
                }
                Phase::Sending => {
                    self.open_gate();
                    let deadline = Instant::now() + self.timeout;
                    if let Err(e) = self.session.send(&self.prompt).await {
                        tracing::error!(session_id = %self.session.session_id(), error = %e, "Failed to send prompt");
                        return self.finish(ServerEvent::error(e.to_string()));
                    }
                    self.phase = Phase::Streaming { deadline };
                }
                Phase::Streaming { deadline } => {
                    let event = match timeout_at(deadline, self.events.recv()).await {
                        Err(_) => {
                            tracing::warn!(
                                session_id = %self.session.session_id(),
                                timeout_secs = self.timeout.as_secs(),
                                "Streaming run timed out"
                            );
                            return self.finish(ServerEvent::error(STREAM_TIMEOUT_MESSAGE));
                        }
                        Ok(None) => {
                            return self.finish(ServerEvent::error(
                                "Session event channel closed before the response completed",
                            ))
                        }
                        Ok(Some(event)) => event,
                    };

                    if let Some(item) = self.accept(event) {
                        return Some(item);
                    }
                }
                Phase::Finished => return None,
            }
        }
    }

    /// Drop whatever the subscription delivered before the prompt goes out
    fn open_gate(&mut self) {
        let mut discarded = 0usize;
        while self.events.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            tracing::debug!(discarded, "Discarded events queued before send");
        }
    }

    fn accept(&mut self, event: AgentEvent) -> Option<ServerEvent> {
        if let Some(id) = &event.id {
            if !self.seen.insert(id.clone()) {
                return None;
            }
        }

        match event.kind() {
            EventKind::SessionIdle => self.finish(ServerEvent::Done),
            EventKind::SessionError => self.finish(ServerEvent::error(event.error_message())),
            _ => ServerEvent::from_agent_event(&event),
        }
    }

    fn finish(&mut self, item: ServerEvent) -> Option<ServerEvent> {
        self.phase = Phase::Finished;
        Some(item)
    }
}
