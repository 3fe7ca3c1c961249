//! The agent loop controller for react-agent.
//!
//! The agent follows a **reason → act** cycle:
//!
//! 1. **Reason**: send the conversation (plus system prompt and tool
//!    definitions) to the model
//! 2. **Act**: if the model requested tools, execute them in order and
//!    append their results
//! 3. Loop back to 1 until the model answers without tool calls or the
//!    iteration cap is reached
//!
//! The cycle is modelled as a small graph (see [`graph`]) so a host can
//! drive it one node at a time through [`AgentLoop::start`] and
//! [`AgentLoop::step`], persisting the [`Checkpoint`] in between.

pub mod graph;
pub mod loop_runner;
pub mod matcher;
pub mod prompts;
pub mod stream_event;

#[cfg(test)]
mod test_helpers;

pub use graph::{Checkpoint, NodeId};
pub use loop_runner::AgentLoop;
pub use stream_event::AgentStreamEvent;
