//! The agent reasoning loop implementation.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use react_agent_config::AgentSettings;
use react_agent_core::error::{Error, Result, ToolError};
use react_agent_core::message::{ConversationState, Message, MessageToolCall, Role};
use react_agent_core::provider::{Provider, ProviderRequest, ToolDefinition};
use react_agent_core::tool::{ToolCall, ToolRegistry, ToolResult};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::graph::{self, Checkpoint, NodeId};
use crate::stream_event::AgentStreamEvent;
use crate::{matcher, prompts};

/// The agent loop: alternates reasoning and tool execution until the model
/// gives a final answer.
///
/// Cheap to clone; the provider and tool registry are shared, so one loop
/// can serve concurrent runs, each over its own state.
#[derive(Clone)]
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// Tool registry
    tools: Arc<ToolRegistry>,

    /// The model to use
    model: String,

    /// System prompt template (`{system_time}` is filled per request)
    system_prompt: String,

    temperature: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    /// Maximum reasoning steps per run
    max_iterations: u32,

    /// Refuse when no tool matches the question
    tool_only: bool,

    /// Run the tool matcher before reasoning
    tool_matching: bool,

    /// Per-call limit for tool execution
    tool_timeout: Option<Duration>,
}

impl AgentLoop {
    /// Create a new agent loop with default settings.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let defaults = AgentSettings::default();
        Self {
            provider,
            tools,
            model: model.into(),
            system_prompt: defaults.system_prompt,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            max_iterations: defaults.max_iterations,
            tool_only: defaults.tool_only,
            tool_matching: defaults.tool_matching,
            tool_timeout: None,
        }
    }

    /// Create an agent loop from the `[agent]` config section.
    pub fn from_settings(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        settings: &AgentSettings,
    ) -> Self {
        Self {
            system_prompt: settings.system_prompt.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            max_iterations: settings.max_iterations,
            tool_only: settings.tool_only,
            tool_matching: settings.tool_matching,
            tool_timeout: settings.tool_timeout_secs.map(Duration::from_secs),
            ..Self::new(provider, settings.model.clone(), tools)
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the default max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of reasoning steps. Values below 1 are raised to 1.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max.max(1);
        self
    }

    /// Replace the tool registry.
    pub fn with_tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_only(mut self, enabled: bool) -> Self {
        self.tool_only = enabled;
        self
    }

    pub fn with_tool_matching(mut self, enabled: bool) -> Self {
        self.tool_matching = enabled;
        self
    }

    /// Fail tool calls that take longer than `timeout` with [`ToolError::Timeout`].
    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Validate `state` and pick the first node to run.
    pub fn start(&self, mut state: ConversationState) -> Result<Checkpoint> {
        state.validate()?;
        state.assign_missing_ids();
        let next = graph::entry_node(&state, self.tool_matching || self.tool_only);
        Ok(Checkpoint {
            state,
            next,
            reasoning_steps: 0,
        })
    }

    /// Execute exactly one node and route to the next.
    ///
    /// The checkpoint may come from a host, so it is checked first (see
    /// [`Checkpoint::check`]). Stepping a finished checkpoint returns it
    /// unchanged.
    pub async fn step(&self, mut checkpoint: Checkpoint) -> Result<Checkpoint> {
        checkpoint.check()?;
        checkpoint.state.assign_missing_ids();
        debug!(
            node = %checkpoint.next,
            entries = checkpoint.state.len(),
            reasoning_steps = checkpoint.reasoning_steps,
            "Agent step"
        );

        match checkpoint.next {
            NodeId::ToolMatcher => {
                let matched = self.match_tools(&checkpoint.state).await;
                checkpoint.state.matched_tools = Some(matched);
                checkpoint.next = graph::route_after_matcher(&checkpoint.state, self.tool_only);
            }
            NodeId::RefuseAnswer => {
                let refusal = self.refuse_answer(&checkpoint.state).await?;
                checkpoint.state.push(refusal);
                checkpoint.next = NodeId::End;
            }
            NodeId::CallModel => {
                if checkpoint.reasoning_steps >= self.max_iterations {
                    return Err(Error::LoopLimitExceeded {
                        max_iterations: self.max_iterations,
                    });
                }
                checkpoint.reasoning_steps += 1;
                let reply = self
                    .call_model(&checkpoint.state, checkpoint.reasoning_steps)
                    .await?;

                if !reply.tool_calls.is_empty()
                    && checkpoint.reasoning_steps >= self.max_iterations
                {
                    warn!(
                        max_iterations = self.max_iterations,
                        "Max reasoning steps reached while the model still requests tools"
                    );
                    return Err(Error::LoopLimitExceeded {
                        max_iterations: self.max_iterations,
                    });
                }

                checkpoint.state.push(reply);
                checkpoint.next = graph::route_after_model(&checkpoint.state);
            }
            NodeId::Tools => {
                self.execute_tools(&mut checkpoint.state).await?;
                checkpoint.next = NodeId::CallModel;
            }
            NodeId::End => {}
        }

        Ok(checkpoint)
    }

    /// Run to completion and return the final state.
    pub async fn run(&self, state: ConversationState) -> Result<ConversationState> {
        info!(
            entries = state.len(),
            model = %self.model,
            max_iterations = self.max_iterations,
            "Starting agent run"
        );

        let mut checkpoint = self.start(state)?;
        while !checkpoint.is_finished() {
            checkpoint = self.step(checkpoint).await?;
        }

        info!(
            entries = checkpoint.state.len(),
            reasoning_steps = checkpoint.reasoning_steps,
            tool_calls = checkpoint.state.tool_call_count(),
            "Agent run finished"
        );
        Ok(checkpoint.state)
    }

    /// Streaming variant of [`run`](Self::run).
    ///
    /// The state is validated up front; the run itself happens on a spawned
    /// task that sends a `message` event per appended entry and then either
    /// `done` or `error`. Dropping the receiver stops the run after the
    /// current step. Must be called from within a tokio runtime.
    pub fn run_stream(&self, state: ConversationState) -> Result<mpsc::Receiver<AgentStreamEvent>> {
        let mut checkpoint = self.start(state)?;
        let (tx, rx) = mpsc::channel::<AgentStreamEvent>(128);
        let agent = self.clone();

        tokio::spawn(async move {
            while !checkpoint.is_finished() {
                let node = checkpoint.next;
                let before = checkpoint.state.len();
                checkpoint = match agent.step(checkpoint).await {
                    Ok(next) => next,
                    Err(e) => {
                        warn!(error = %e, "Streaming agent run failed");
                        let _ = tx
                            .send(AgentStreamEvent::Error {
                                message: e.to_string(),
                                kind: e.kind().to_string(),
                            })
                            .await;
                        return;
                    }
                };

                for message in &checkpoint.state.messages[before..] {
                    let event = AgentStreamEvent::Message {
                        node,
                        message: message.clone(),
                    };
                    if tx.send(event).await.is_err() {
                        debug!("Stream receiver dropped, stopping run");
                        return;
                    }
                }
            }

            let _ = tx
                .send(AgentStreamEvent::Done {
                    reasoning_steps: checkpoint.reasoning_steps,
                    state: checkpoint.state,
                })
                .await;
        });

        Ok(rx)
    }

    /// Tool definitions offered to the model for this state.
    fn offered_tools(&self, state: &ConversationState) -> Vec<ToolDefinition> {
        match &state.matched_tools {
            Some(names) if !names.is_empty() => self.tools.definitions_for(names),
            _ => self.tools.definitions(),
        }
    }

    async fn call_model(&self, state: &ConversationState, step: u32) -> Result<Message> {
        let system = prompts::render_system_prompt(&self.system_prompt, Utc::now());
        let mut messages = Vec::with_capacity(state.len() + 1);
        messages.push(Message::system(system));
        messages.extend(state.messages.iter().cloned());

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.offered_tools(state),
        };

        let response = self.provider.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                total_tokens = usage.total_tokens,
                "Model responded"
            );
        }

        let mut reply = response.message;
        reply.id = String::new();
        reply.role = Role::Assistant;
        reply.tool_call_id = None;
        for (index, call) in reply.tool_calls.iter_mut().enumerate() {
            if call.id.is_empty() {
                call.id = format!("call_{step}_{index}");
            }
        }
        if !reply.tool_calls.is_empty() {
            debug!(
                tool_count = reply.tool_calls.len(),
                tools = ?reply.tool_calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                "Model requested tool calls"
            );
        }
        Ok(reply)
    }

    /// Execute every unanswered call of the last assistant entry, in order.
    async fn execute_tools(&self, state: &mut ConversationState) -> Result<()> {
        let calls: Vec<MessageToolCall> =
            state.pending_tool_calls().into_iter().cloned().collect();

        for tc in calls {
            let outcome = match call_arguments(&tc) {
                Ok(arguments) => {
                    let call = ToolCall {
                        id: tc.id.clone(),
                        name: tc.name.clone(),
                        arguments,
                    };
                    self.execute_one(&call).await
                }
                Err(e) => Err(e),
            };

            let entry = match outcome {
                Ok(result) => {
                    let content = if result.success || result.output.starts_with("Error:") {
                        result.output
                    } else {
                        format!("Error: {}", result.output)
                    };
                    let mut entry = Message::tool_result(&tc.id, &tc.name, content);
                    entry
                        .metadata
                        .insert("success".into(), result.success.into());
                    if let Some(data) = result.data {
                        entry.metadata.insert("data".into(), data);
                    }
                    entry
                }
                Err(e) if e.is_fatal() => {
                    return Err(Error::CollaboratorUnavailable(format!("tool {}: {e}", tc.name)));
                }
                Err(e) => {
                    warn!(tool = %tc.name, error = %e, "Tool execution failed");
                    // Reported back so the model can recover.
                    let mut entry = Message::tool_result(&tc.id, &tc.name, format!("Error: {e}"));
                    entry.metadata.insert("success".into(), false.into());
                    entry
                }
            };
            state.push(entry);
        }
        Ok(())
    }

    async fn execute_one(&self, call: &ToolCall) -> std::result::Result<ToolResult, ToolError> {
        let started = std::time::Instant::now();
        let result = match self.tool_timeout {
            Some(limit) => tokio::time::timeout(limit, self.tools.execute(call))
                .await
                .unwrap_or_else(|_| {
                    Err(ToolError::Timeout {
                        tool_name: call.name.clone(),
                        timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    })
                }),
            None => self.tools.execute(call).await,
        };
        debug!(
            tool = %call.name,
            duration_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "Tool executed"
        );
        result
    }

    /// Ask the model which tools fit the latest user entry.
    ///
    /// Falls back to every registered tool when the model fails or its reply
    /// cannot be parsed.
    async fn match_tools(&self, state: &ConversationState) -> Vec<String> {
        let all: Vec<String> = self.tools.names().into_iter().map(String::from).collect();
        if all.is_empty() {
            return Vec::new();
        }
        let Some(user_text) = state.last_user_message() else {
            return Vec::new();
        };

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompts::tool_matching_prompt(
                user_text,
                &self.tools.definitions(),
            ))],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: Vec::new(),
        };

        let reply = match self.provider.complete(request).await {
            Ok(response) => response.message.content,
            Err(e) => {
                warn!(error = %e, "Tool matching failed, offering all tools");
                return all;
            }
        };

        match matcher::parse_match_tools(&reply) {
            Some(names) => {
                let matched = matcher::retain_known(names, &self.tools);
                debug!(matched = ?matched, "Tools matched");
                matched
            }
            None => {
                warn!(reply = %reply, "Unparseable tool matching reply, offering all tools");
                all
            }
        }
    }

    async fn refuse_answer(&self, state: &ConversationState) -> Result<Message> {
        let question = state.last_user_message().unwrap_or_default();
        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::user(prompts::refusal_prompt(
                question,
                &self.tools.definitions(),
            ))],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: Vec::new(),
        };

        let response = self.provider.complete(request).await?;
        info!("No matching tool for the question, refusing");
        Ok(Message::assistant(response.message.content))
    }
}

/// Structured arguments for a call. Providers hand over arguments they
/// could not parse as a JSON string; those get one more parse attempt.
fn call_arguments(tc: &MessageToolCall) -> std::result::Result<serde_json::Value, ToolError> {
    match &tc.arguments {
        serde_json::Value::Null => Ok(serde_json::json!({})),
        serde_json::Value::String(raw) => serde_json::from_str(raw).map_err(|e| {
            ToolError::InvalidArguments(format!("arguments for '{}' are not valid JSON: {e}", tc.name))
        }),
        other => Ok(other.clone()),
    }
}
