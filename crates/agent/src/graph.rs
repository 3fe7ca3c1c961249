//! The agent as a graph of nodes.
//!
//! ```text
//!            ┌──────────────┐  tool_only && nothing matched   ┌───────────────┐
//!  entry ──▶ │ tool_matcher │ ──────────────────────────────▶ │ refuse_answer │ ──▶ end
//!     │      └──────────────┘                                  └───────────────┘
//!     │             │ otherwise
//!     ▼             ▼
//!  ┌────────────────────┐  tool calls   ┌───────┐
//!  │     call_model     │ ────────────▶ │ tools │
//!  │                    │ ◀──────────── │       │
//!  └────────────────────┘               └───────┘
//!            │ final answer
//!            ▼
//!           end
//! ```
//!
//! Routing is a pure function of the state and the agent's settings, so a
//! host holding a [`Checkpoint`] can persist it between steps and resume
//! with any equivalent agent.

use react_agent_core::error::{Error, Result};
use react_agent_core::message::ConversationState;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A node of the agent graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    ToolMatcher,
    RefuseAnswer,
    CallModel,
    Tools,
    End,
}

impl NodeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToolMatcher => "tool_matcher",
            Self::RefuseAnswer => "refuse_answer",
            Self::CallModel => "call_model",
            Self::Tools => "tools",
            Self::End => "end",
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything needed to resume a run: the state so far, the node to
/// execute next and how many reasoning steps have been spent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Checkpoint {
    pub state: ConversationState,
    pub next: NodeId,
    #[serde(default)]
    pub reasoning_steps: u32,
}

impl Checkpoint {
    pub fn is_finished(&self) -> bool {
        self.next == NodeId::End
    }

    /// Check that this checkpoint can be stepped.
    ///
    /// The state must pass [`ConversationState::validate`], and `next` must
    /// agree with it: `tools` exactly when calls are pending, every other
    /// node only when none are. Finished checkpoints are accepted as is.
    pub fn check(&self) -> Result<()> {
        if self.is_finished() {
            return Ok(());
        }
        self.state.validate()?;
        let pending = !self.state.pending_tool_calls().is_empty();
        match (self.next, pending) {
            (NodeId::Tools, false) => Err(Error::InvalidState(
                "checkpoint routes to tools but no tool calls are pending".into(),
            )),
            (NodeId::Tools, true) => Ok(()),
            (node, true) => Err(Error::InvalidState(format!(
                "checkpoint routes to {node} while tool calls are unanswered"
            ))),
            (_, false) => Ok(()),
        }
    }
}

/// First node for a validated state.
///
/// A state whose last assistant entry still has unanswered calls resumes at
/// `tools`, so those calls are executed before reasoning again.
pub fn entry_node(state: &ConversationState, tool_matching: bool) -> NodeId {
    if !state.pending_tool_calls().is_empty() {
        NodeId::Tools
    } else if tool_matching {
        NodeId::ToolMatcher
    } else {
        NodeId::CallModel
    }
}

pub fn route_after_matcher(state: &ConversationState, tool_only: bool) -> NodeId {
    let nothing_matched = state
        .matched_tools
        .as_ref()
        .is_none_or(|tools| tools.is_empty());
    if tool_only && nothing_matched {
        NodeId::RefuseAnswer
    } else {
        NodeId::CallModel
    }
}

pub fn route_after_model(state: &ConversationState) -> NodeId {
    match state.last() {
        Some(last) if !last.tool_calls.is_empty() => NodeId::Tools,
        _ => NodeId::End,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use react_agent_core::message::{Message, MessageToolCall};

    fn with_call() -> ConversationState {
        let mut state = ConversationState::from_user("What is 2+2?");
        state.push(Message::assistant_tool_calls(
            "",
            vec![MessageToolCall {
                id: "call_1".into(),
                name: "calculator".into(),
                arguments: serde_json::json!({"expr": "2+2"}),
            }],
        ));
        state
    }

    #[test]
    fn entry_depends_on_matching_flag() {
        let state = ConversationState::from_user("hi");
        assert_eq!(entry_node(&state, false), NodeId::CallModel);
        assert_eq!(entry_node(&state, true), NodeId::ToolMatcher);
    }

    #[test]
    fn entry_resumes_pending_calls() {
        assert_eq!(entry_node(&with_call(), true), NodeId::Tools);

        let mut answered = with_call();
        answered.push(Message::tool_result("call_1", "calculator", "4"));
        assert_eq!(entry_node(&answered, false), NodeId::CallModel);
    }

    #[test]
    fn matcher_routes_to_refusal_only_when_tool_only() {
        let mut state = ConversationState::from_user("Write a poem");
        state.matched_tools = Some(vec![]);
        assert_eq!(route_after_matcher(&state, true), NodeId::RefuseAnswer);
        assert_eq!(route_after_matcher(&state, false), NodeId::CallModel);

        state.matched_tools = Some(vec!["web_search".into()]);
        assert_eq!(route_after_matcher(&state, true), NodeId::CallModel);
    }

    #[test]
    fn model_output_routing() {
        assert_eq!(route_after_model(&with_call()), NodeId::Tools);

        let mut answered = ConversationState::from_user("hi");
        answered.push(Message::assistant("hello"));
        assert_eq!(route_after_model(&answered), NodeId::End);
    }

    fn checkpoint(state: ConversationState, next: NodeId) -> Checkpoint {
        Checkpoint {
            state,
            next,
            reasoning_steps: 1,
        }
    }

    #[test]
    fn checkpoint_next_must_agree_with_state() {
        assert!(checkpoint(with_call(), NodeId::Tools).check().is_ok());
        assert!(checkpoint(ConversationState::from_user("hi"), NodeId::CallModel)
            .check()
            .is_ok());

        for next in [NodeId::CallModel, NodeId::ToolMatcher, NodeId::RefuseAnswer] {
            let err = checkpoint(with_call(), next).check().unwrap_err();
            assert!(matches!(err, Error::InvalidState(_)), "{next}: {err}");
        }
        let err = checkpoint(ConversationState::from_user("hi"), NodeId::Tools)
            .check()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn checkpoint_state_is_validated() {
        let err = checkpoint(ConversationState::new(), NodeId::CallModel)
            .check()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));

        // Finished checkpoints are never re-run, so they are not inspected.
        assert!(checkpoint(ConversationState::new(), NodeId::End).check().is_ok());
    }

    #[test]
    fn checkpoint_serializes_node_names() {
        let cp = Checkpoint {
            state: ConversationState::from_user("hi"),
            next: NodeId::CallModel,
            reasoning_steps: 0,
        };
        let json = serde_json::to_value(&cp).unwrap();
        assert_eq!(json["next"], "call_model");

        let back: Checkpoint = serde_json::from_value(serde_json::json!({
            "state": {"messages": [{"role": "user", "content": "hi"}]},
            "next": "tools"
        }))
        .unwrap();
        assert_eq!(back.next, NodeId::Tools);
        assert_eq!(back.reasoning_steps, 0);
        assert!(!back.is_finished());
    }
}
