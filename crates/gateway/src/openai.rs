//! OpenAI-compatible endpoints.
//!
//! - `POST /openai/chat/completions`: the agent's final answer as a chat
//!   completion, or a `chat.completion.chunk` SSE stream with `stream: true`
//! - `GET  /openai/models`: models reported by the provider
//!
//! Tool calls happen inside the agent; clients only see the answer.

use axum::{
    Router,
    extract::State,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};
use utoipa::ToSchema;

use react_agent_agent::AgentStreamEvent;
use react_agent_core::message::{ConversationState, Message, MessageToolCall, Role};

use crate::{ApiError, ErrorResponse, RunOverrides, SharedState};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/chat/completions", post(chat_completions_handler))
        .route("/models", get(models_handler))
        .with_state(state)
}

// ── Request / response types ──────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<MessageContent>,
    /// Calls an earlier assistant turn made
    #[serde(default)]
    pub tool_calls: Vec<ChatToolCall>,
    #[serde(default)]
    pub tool_call_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatToolCall {
    pub id: String,
    pub function: ChatFunction,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatFunction {
    pub name: String,
    /// JSON-encoded arguments
    #[serde(default)]
    pub arguments: String,
}

impl From<ChatToolCall> for MessageToolCall {
    fn from(call: ChatToolCall) -> Self {
        // Unparseable arguments stay a string; the loop reports them to the model.
        let raw = call.function.arguments;
        let arguments = if raw.trim().is_empty() {
            serde_json::json!({})
        } else {
            serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw))
        };
        MessageToolCall {
            id: call.id,
            name: call.function.name,
            arguments,
        }
    }
}

/// Plain text, or the multi-part form where only text parts are kept.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl MessageContent {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Parts(parts) => parts
                .into_iter()
                .filter(|p| p.kind == "text")
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Choice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AssistantMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionChunk<'a> {
    id: &'a str,
    object: &'static str,
    created: i64,
    model: &'a str,
    choices: [ChunkChoice; 1],
}

#[derive(Debug, Serialize)]
struct ChunkChoice {
    index: u32,
    delta: Delta,
    finish_reason: Option<&'static str>,
}

#[derive(Debug, Default, Serialize)]
struct Delta {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelEntry>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ModelEntry {
    pub id: String,
    pub object: String,
    pub owned_by: String,
}

/// Convert OpenAI-style messages into a conversation state.
fn to_state(messages: Vec<ChatMessage>) -> Result<ConversationState, ApiError> {
    let mut state = ConversationState::new();
    for (i, m) in messages.into_iter().enumerate() {
        let content = m.content.map(MessageContent::into_text).unwrap_or_default();
        let message = match m.role.as_str() {
            "user" => Message::user(content),
            "assistant" => Message::assistant_tool_calls(
                content,
                m.tool_calls.into_iter().map(MessageToolCall::from).collect(),
            ),
            "system" | "developer" => Message::system(content),
            "tool" => {
                let call_id = m.tool_call_id.ok_or_else(|| {
                    ApiError::bad_request(format!("message {i}: tool message without tool_call_id"))
                })?;
                Message::tool_result(call_id, m.name.unwrap_or_default(), content)
            }
            other => {
                return Err(ApiError::bad_request(format!(
                    "message {i}: unsupported role '{other}'"
                )));
            }
        };
        state.push(message);
    }
    Ok(state)
}

fn chunk_event(id: &str, model: &str, created: i64, delta: Delta, finish: Option<&'static str>) -> SseEvent {
    let chunk = ChatCompletionChunk {
        id,
        object: "chat.completion.chunk",
        created,
        model,
        choices: [ChunkChoice {
            index: 0,
            delta,
            finish_reason: finish,
        }],
    };
    SseEvent::default().data(serde_json::to_string(&chunk).unwrap_or_default())
}

// ── Handlers ──────────────────────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/openai/chat/completions",
    tag = "openai",
    request_body = ChatCompletionRequest,
    responses(
        (status = 200, description = "The final answer; a `chat.completion.chunk` event stream when `stream` is true", body = ChatCompletion),
        (status = 400, description = "Unsupported role or invalid conversation", body = ErrorResponse),
        (status = 422, description = "Iteration cap reached", body = ErrorResponse),
        (status = 502, description = "Model or tool service failed", body = ErrorResponse),
    )
)]
pub(crate) async fn chat_completions_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatCompletionRequest>,
) -> Result<Response, ApiError> {
    let overrides = RunOverrides {
        model: payload.model.clone(),
        ..RunOverrides::default()
    };
    let agent = state.agent_for(&overrides);
    let model = agent.model().to_string();
    let conversation = to_state(payload.messages)?;
    info!(
        entries = conversation.len(),
        stream = payload.stream,
        model = %model,
        "openai/chat/completions request"
    );

    let id = format!("chatcmpl-{}", uuid::Uuid::new_v4().simple());
    let created = chrono::Utc::now().timestamp();

    if !payload.stream {
        let final_state = agent.run(conversation).await?;
        let content = final_state.final_answer().unwrap_or_default().to_string();
        let completion = ChatCompletion {
            id,
            object: "chat.completion".into(),
            created,
            model,
            choices: vec![Choice {
                index: 0,
                message: AssistantMessage {
                    role: Role::Assistant.as_str().into(),
                    content,
                },
                finish_reason: "stop".into(),
            }],
        };
        return Ok(Json(completion).into_response());
    }

    let rx = agent.run_stream(conversation)?;

    let opening = chunk_event(
        &id,
        &model,
        created,
        Delta {
            role: Some(Role::Assistant.as_str()),
            content: None,
        },
        None,
    );
    let body = ReceiverStream::new(rx).filter_map(move |event| match event {
        AgentStreamEvent::Message { message, .. } if message.is_final_answer() => Some(chunk_event(
            &id,
            &model,
            created,
            Delta {
                role: None,
                content: Some(message.content),
            },
            None,
        )),
        AgentStreamEvent::Message { .. } => None,
        AgentStreamEvent::Done { .. } => Some(chunk_event(&id, &model, created, Delta::default(), Some("stop"))),
        AgentStreamEvent::Error { message, kind } => {
            warn!(kind = %kind, error = %message, "Streaming completion failed");
            let data = serde_json::json!({ "error": { "message": message, "type": kind } });
            Some(SseEvent::default().data(data.to_string()))
        }
    });

    let stream = tokio_stream::once(opening)
        .chain(body)
        .chain(tokio_stream::once(SseEvent::default().data("[DONE]")))
        .map(Ok::<_, Infallible>);

    Ok(Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response())
}

#[utoipa::path(
    get,
    path = "/openai/models",
    tag = "openai",
    responses((status = 200, description = "Models the provider offers", body = ModelList))
)]
pub(crate) async fn models_handler(State(state): State<SharedState>) -> Json<ModelList> {
    let provider = state.agent.provider();
    let configured = state.agent.model().to_string();

    let mut ids = match provider.list_models().await {
        Ok(models) => models,
        Err(e) => {
            warn!(error = %e, "Could not list provider models");
            Vec::new()
        }
    };
    if !ids.contains(&configured) {
        ids.insert(0, configured);
    }

    Json(ModelList {
        object: "list".into(),
        data: ids
            .into_iter()
            .map(|id| ModelEntry {
                id,
                object: "model".into(),
                owned_by: provider.name().to_string(),
            })
            .collect(),
    })
}
