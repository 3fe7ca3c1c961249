//! OpenAPI document and Swagger UI.

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use react_agent_agent::{Checkpoint, NodeId};
use react_agent_core::message::{ConversationState, Message, MessageToolCall, Role};

use crate::error::ErrorResponse;
use crate::langgraph::{HealthResponse, RunRequest, StepRequest};
use crate::openai::{
    AssistantMessage, ChatCompletion, ChatCompletionRequest, ChatFunction, ChatMessage,
    ChatToolCall, Choice, ContentPart, MessageContent, ModelEntry, ModelList,
};
use crate::RunOverrides;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "react-agent API",
        description = "Tool-calling ReAct agent: graph-style and OpenAI-compatible endpoints"
    ),
    paths(
        crate::langgraph::health_handler,
        crate::langgraph::call_handler,
        crate::langgraph::stream_handler,
        crate::langgraph::start_handler,
        crate::langgraph::step_handler,
        crate::openai::chat_completions_handler,
        crate::openai::models_handler,
    ),
    components(schemas(
        ErrorResponse,
        // Conversation state
        ConversationState,
        Message,
        MessageToolCall,
        Role,
        // Graph
        Checkpoint,
        NodeId,
        RunRequest,
        StepRequest,
        RunOverrides,
        HealthResponse,
        // OpenAI dialect
        ChatCompletionRequest,
        ChatMessage,
        ChatToolCall,
        ChatFunction,
        MessageContent,
        ContentPart,
        ChatCompletion,
        Choice,
        AssistantMessage,
        ModelList,
        ModelEntry,
    )),
    tags(
        (name = "langgraph", description = "Run, stream or step the agent over a conversation state"),
        (name = "openai", description = "OpenAI chat-completions dialect"),
    )
)]
pub struct ApiDoc;

/// `/openapi.json` plus Swagger UI at `/docs`.
pub fn docs() -> Router {
    SwaggerUi::new("/docs")
        .url("/openapi.json", ApiDoc::openapi())
        .into()
}
