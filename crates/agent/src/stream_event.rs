//! Agent-level streaming events.
//!
//! `AgentStreamEvent` reports a run's progress as it happens so the gateway
//! can forward it to clients over SSE.

use crate::graph::NodeId;
use react_agent_core::message::{ConversationState, Message};
use serde::{Deserialize, Serialize};

/// Events emitted by [`AgentLoop::run_stream`](crate::AgentLoop::run_stream).
///
/// - `message`: an entry was appended by the named node
/// - `done`: the run finished; carries the final state
/// - `error`: the run failed; no further events follow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentStreamEvent {
    Message { node: NodeId, message: Message },

    Done {
        state: ConversationState,
        reasoning_steps: u32,
    },

    Error { message: String, kind: String },
}

impl AgentStreamEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Message { .. } => "message",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_event_serialization() {
        let event = AgentStreamEvent::Message {
            node: NodeId::CallModel,
            message: Message::assistant("4"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["node"], "call_model");
        assert_eq!(json["message"]["content"], "4");
        assert_eq!(event.event_type(), "message");
    }

    #[test]
    fn done_event_carries_state() {
        let event = AgentStreamEvent::Done {
            state: ConversationState::from_user("hi"),
            reasoning_steps: 1,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"done""#));
        assert!(json.contains(r#""reasoning_steps":1"#));
        assert_eq!(event.event_type(), "done");
    }

    #[test]
    fn error_event_round_trip() {
        let json = r#"{"type":"error","message":"boom","kind":"collaborator_unavailable"}"#;
        let event: AgentStreamEvent = serde_json::from_str(json).unwrap();
        match &event {
            AgentStreamEvent::Error { message, kind } => {
                assert_eq!(message, "boom");
                assert_eq!(kind, "collaborator_unavailable");
            }
            _ => panic!("Wrong variant"),
        }
        assert_eq!(event.event_type(), "error");
    }
}
