//! Message and Conversation State domain types.
//!
//! These are the value objects that flow through a run:
//! the caller supplies a state with a user entry, the reasoning step appends
//! assistant entries, and the execution step appends tool results.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::Error;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
    /// System instructions supplied by the caller
    System,
    /// Tool execution result
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Tool => "tool",
        }
    }
}

/// A single entry in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    /// Entry ID, assigned on append when empty
    #[serde(default)]
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    #[serde(default)]
    pub content: String,

    /// Tool calls requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<MessageToolCall>,

    /// If this is a tool result, which tool call it responds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,

    /// If this is a tool result, the name of the tool that produced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Optional metadata (provider info, tool success flag, etc.)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    #[schema(value_type = Object)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
            metadata: serde_json::Map::new(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create an assistant message requesting tool calls.
    pub fn assistant_tool_calls(
        content: impl Into<String>,
        tool_calls: Vec<MessageToolCall>,
    ) -> Self {
        let mut msg = Self::with_role(Role::Assistant, content);
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create a tool result message.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let mut msg = Self::with_role(Role::Tool, content);
        msg.tool_call_id = Some(tool_call_id.into());
        msg.name = Some(tool_name.into());
        msg
    }

    /// True for an assistant entry that ends the loop.
    pub fn is_final_answer(&self) -> bool {
        self.role == Role::Assistant && self.tool_calls.is_empty()
    }
}

/// A tool call embedded in an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MessageToolCall {
    /// Unique ID for this tool call
    #[serde(default)]
    pub id: String,

    /// Name of the tool to invoke
    pub name: String,

    /// Structured arguments
    #[serde(default)]
    #[schema(value_type = Object)]
    pub arguments: serde_json::Value,
}

/// The state one run owns: an append-only log of entries plus scalar
/// context fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConversationState {
    /// Ordered entries
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Caller-provided scalar context (user id, locale, ...)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    #[schema(value_type = Object)]
    pub context: serde_json::Map<String, serde_json::Value>,

    /// Tools selected by the matching step, if it ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_tools: Option<Vec<String>>,
}

impl ConversationState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state holding a single user entry.
    pub fn from_user(content: impl Into<String>) -> Self {
        let mut state = Self::new();
        state.push(Message::user(content));
        state
    }

    /// Append an entry. Entries without an ID get `msg_<index>`.
    pub fn push(&mut self, mut message: Message) {
        if message.id.is_empty() {
            message.id = format!("msg_{}", self.messages.len());
        }
        self.messages.push(message);
    }

    /// Fill in IDs for entries supplied without one.
    pub fn assign_missing_ids(&mut self) {
        for (i, m) in self.messages.iter_mut().enumerate() {
            if m.id.is_empty() {
                m.id = format!("msg_{i}");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Content of the most recent user entry.
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// The final answer, if the last entry is one.
    pub fn final_answer(&self) -> Option<&str> {
        self.last()
            .filter(|m| m.is_final_answer())
            .map(|m| m.content.as_str())
    }

    /// Total tool calls requested across the conversation.
    pub fn tool_call_count(&self) -> usize {
        self.messages.iter().map(|m| m.tool_calls.len()).sum()
    }

    /// Tool calls of the latest assistant entry that have no result yet.
    pub fn pending_tool_calls(&self) -> Vec<&MessageToolCall> {
        let Some(pos) = self.messages.iter().rposition(|m| m.role == Role::Assistant) else {
            return Vec::new();
        };
        let answered: Vec<&str> = self.messages[pos + 1..]
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();
        self.messages[pos]
            .tool_calls
            .iter()
            .filter(|tc| !answered.contains(&tc.id.as_str()))
            .collect()
    }

    /// Check that this state can start or resume a run.
    ///
    /// Requires at least one user entry, and every tool result must answer
    /// an unmatched call of the immediately preceding assistant entry.
    /// Calls left unanswered are only allowed at the tail.
    pub fn validate(&self) -> Result<(), Error> {
        if self.messages.is_empty() {
            return Err(Error::InvalidState("conversation has no entries".into()));
        }
        if !self.messages.iter().any(|m| m.role == Role::User) {
            return Err(Error::InvalidState("conversation has no user entry".into()));
        }

        let mut pending: Vec<&str> = Vec::new();
        for (i, m) in self.messages.iter().enumerate() {
            match m.role {
                Role::Tool => {
                    let Some(call_id) = m.tool_call_id.as_deref() else {
                        return Err(Error::InvalidState(format!(
                            "tool entry {i} has no tool_call_id"
                        )));
                    };
                    let Some(idx) = pending.iter().position(|p| *p == call_id) else {
                        return Err(Error::InvalidState(format!(
                            "tool entry {i} answers unknown or already answered call '{call_id}'"
                        )));
                    };
                    pending.remove(idx);
                }
                role => {
                    if !pending.is_empty() {
                        return Err(Error::InvalidState(format!(
                            "{} entry {i} follows unanswered tool calls: {}",
                            role.as_str(),
                            pending.join(", ")
                        )));
                    }
                    if role == Role::Assistant {
                        for tc in &m.tool_calls {
                            if tc.id.is_empty() {
                                return Err(Error::InvalidState(format!(
                                    "assistant entry {i} has a tool call without an id"
                                )));
                            }
                            if pending.contains(&tc.id.as_str()) {
                                return Err(Error::InvalidState(format!(
                                    "assistant entry {i} repeats tool call id '{}'",
                                    tc.id
                                )));
                            }
                            pending.push(&tc.id);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
