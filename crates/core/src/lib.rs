//! # react-agent core
//!
//! Domain types, traits, and error definitions for the react-agent
//! tool-calling loop. This crate has **no runtime or HTTP dependencies**: it
//! defines the model that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! The two collaborators the agent loop depends on (the model and the tools)
//! are defined as traits here. Implementations live in their own crates,
//! which keeps the loop testable with scripted mocks.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, ToolError};
pub use message::{ConversationState, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
