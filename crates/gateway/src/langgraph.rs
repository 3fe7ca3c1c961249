//! Graph-style endpoints over the conversation state.
//!
//! - `GET  /langgraph/health`: liveness
//! - `POST /langgraph/call`: run to completion, return the final state
//! - `POST /langgraph/stream`: run, streaming `message` / `done` / `error` SSE events
//! - `POST /langgraph/start`: validate a state and return the first checkpoint
//! - `POST /langgraph/step`: execute one node of a checkpoint

use axum::{
    Router,
    extract::State,
    response::Json,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::info;
use utoipa::ToSchema;

use react_agent_agent::Checkpoint;
use react_agent_core::message::{ConversationState, Message};

use crate::{ApiError, ErrorResponse, RunOverrides, SharedState};

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/call", post(call_handler))
        .route("/stream", post(stream_handler))
        .route("/start", post(start_handler))
        .route("/step", post(step_handler))
        .with_state(state)
}

/// Body of `/call`, `/stream` and `/start`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RunRequest {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub context: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub config: RunOverrides,
}

impl RunRequest {
    fn into_parts(self) -> (ConversationState, RunOverrides) {
        let state = ConversationState {
            messages: self.messages,
            context: self.context,
            matched_tools: None,
        };
        (state, self.config)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct StepRequest {
    pub checkpoint: Checkpoint,
    #[serde(default)]
    pub config: RunOverrides,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/langgraph/health",
    tag = "langgraph",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub(crate) async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}

#[utoipa::path(
    post,
    path = "/langgraph/call",
    tag = "langgraph",
    request_body = RunRequest,
    responses(
        (status = 200, description = "Final conversation state", body = ConversationState),
        (status = 400, description = "Invalid conversation state", body = ErrorResponse),
        (status = 422, description = "Iteration cap reached", body = ErrorResponse),
        (status = 502, description = "Model or tool service failed", body = ErrorResponse),
    )
)]
pub(crate) async fn call_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RunRequest>,
) -> Result<Json<ConversationState>, ApiError> {
    let (conversation, overrides) = payload.into_parts();
    info!(entries = conversation.len(), "langgraph/call request");

    let agent = state.agent_for(&overrides);
    let final_state = agent.run(conversation).await?;
    Ok(Json(final_state))
}

#[utoipa::path(
    post,
    path = "/langgraph/stream",
    tag = "langgraph",
    request_body = RunRequest,
    responses(
        (status = 200, description = "`message`, then `done` or `error` server-sent events", body = String, content_type = "text/event-stream"),
        (status = 400, description = "Invalid conversation state", body = ErrorResponse),
    )
)]
pub(crate) async fn stream_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RunRequest>,
) -> Result<Sse<impl futures::Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let (conversation, overrides) = payload.into_parts();
    info!(entries = conversation.len(), "langgraph/stream SSE request");

    let rx = state.agent_for(&overrides).run_stream(conversation)?;

    let stream = ReceiverStream::new(rx).map(|event| {
        let event_type = event.event_type();
        let data = serde_json::to_string(&event).unwrap_or_default();
        Ok(SseEvent::default().event(event_type).data(data))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[utoipa::path(
    post,
    path = "/langgraph/start",
    tag = "langgraph",
    request_body = RunRequest,
    responses(
        (status = 200, description = "First checkpoint", body = Checkpoint),
        (status = 400, description = "Invalid conversation state", body = ErrorResponse),
    )
)]
pub(crate) async fn start_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RunRequest>,
) -> Result<Json<Checkpoint>, ApiError> {
    let (conversation, overrides) = payload.into_parts();
    let checkpoint = state.agent_for(&overrides).start(conversation)?;
    Ok(Json(checkpoint))
}

#[utoipa::path(
    post,
    path = "/langgraph/step",
    tag = "langgraph",
    request_body = StepRequest,
    responses(
        (status = 200, description = "Checkpoint after one node", body = Checkpoint),
        (status = 400, description = "Invalid or inconsistent checkpoint", body = ErrorResponse),
        (status = 422, description = "Iteration cap reached", body = ErrorResponse),
        (status = 502, description = "Model or tool service failed", body = ErrorResponse),
    )
)]
pub(crate) async fn step_handler(
    State(state): State<SharedState>,
    Json(payload): Json<StepRequest>,
) -> Result<Json<Checkpoint>, ApiError> {
    let checkpoint = state
        .agent_for(&payload.config)
        .step(payload.checkpoint)
        .await?;
    Ok(Json(checkpoint))
}
