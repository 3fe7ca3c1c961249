//! Typed tool handlers.
//!
//! [`typed_tool`] adapts an async function taking a serde-deserializable
//! argument struct into a [`Tool`]. Arguments that fail to deserialize are
//! reported as [`ToolError::InvalidArguments`] before the handler runs.

use async_trait::async_trait;
use react_agent_core::error::ToolError;
use react_agent_core::tool::{Tool, ToolResult};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::marker::PhantomData;

pub struct FnTool<A, F> {
    name: String,
    description: String,
    schema: serde_json::Value,
    handler: F,
    _args: PhantomData<fn(A)>,
}

/// Build a tool from a name, description, JSON schema and async handler.
pub fn typed_tool<A, F, Fut>(
    name: impl Into<String>,
    description: impl Into<String>,
    schema: serde_json::Value,
    handler: F,
) -> FnTool<A, F>
where
    A: DeserializeOwned + Send,
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ToolResult, ToolError>> + Send,
{
    FnTool {
        name: name.into(),
        description: description.into(),
        schema,
        handler,
        _args: PhantomData,
    }
}

#[async_trait]
impl<A, F, Fut> Tool for FnTool<A, F>
where
    A: DeserializeOwned + Send,
    F: Fn(A) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ToolResult, ToolError>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        self.schema.clone()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let args: A = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(format!("{}: {e}", self.name)))?;
        (self.handler)(args).await
    }
}
