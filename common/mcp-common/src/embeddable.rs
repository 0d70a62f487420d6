//! In-process tool dispatch
//!
//! [`EmbeddableMcp`] lets a host (or a test) call a server's tools directly,
//! without a transport in between.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;

/// Error type for in-process tool calls
#[derive(Debug, thiserror::Error)]
pub enum EmbeddableError {
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Arguments did not match the tool's parameter type
    #[error("invalid parameters: {0}")]
    InvalidParams(#[from] serde_json::Error),

    #[error("mcp error: {0}")]
    McpError(String),
}

impl From<rmcp::ErrorData> for EmbeddableError {
    fn from(err: rmcp::ErrorData) -> Self {
        EmbeddableError::McpError(err.message.to_string())
    }
}

pub type EmbeddableResult<T> = Result<T, EmbeddableError>;

/// An MCP server whose tools can be invoked in-process
///
/// Implementations usually delegate `list_tools` to their `ToolRouter` and
/// match on the tool name in `call_tool`, deserializing `params` into the
/// tool's parameter struct.
///
/// # Example
///
/// ```rust,ignore
/// use mcp_common::{EmbeddableError, EmbeddableMcp};
///
/// let result = server
///     .call_tool("query_data", serde_json::json!({ "sql": "SELECT 1" }))
///     .await?;
///
/// match server.call_tool("no_such_tool", serde_json::json!({})).await {
///     Err(EmbeddableError::ToolNotFound(name)) => eprintln!("unknown tool {}", name),
///     other => { /* ... */ }
/// }
/// ```
#[async_trait]
pub trait EmbeddableMcp: Send + Sync {
    /// Name used in MCP configuration files
    fn server_name(&self) -> &str;

    fn list_tools(&self) -> Vec<Tool>;

    /// Invoke `name` with a JSON object of arguments
    ///
    /// # Arguments
    ///
    /// * `name` - Tool name as listed by [`EmbeddableMcp::list_tools`]
    /// * `params` - Arguments object; deserialization failures become
    ///   [`EmbeddableError::InvalidParams`]
    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult>;

    fn server_description(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoServer;

    #[async_trait]
    impl EmbeddableMcp for EchoServer {
        fn server_name(&self) -> &str {
            "echo"
        }

        fn list_tools(&self) -> Vec<Tool> {
            vec![]
        }

        async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
            match name {
                "echo" => {
                    let text: String = serde_json::from_value(params)?;
                    Ok(crate::json_success(&text)?)
                }
                _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let result = EchoServer.call_tool("unknown", serde_json::json!({})).await;
        assert!(matches!(result, Err(EmbeddableError::ToolNotFound(_))));
    }

    #[tokio::test]
    async fn test_bad_params_are_invalid_params() {
        let result = EchoServer.call_tool("echo", serde_json::json!(42)).await;
        assert!(matches!(result, Err(EmbeddableError::InvalidParams(_))));
    }

    #[test]
    fn test_default_description() {
        assert_eq!(EchoServer.server_name(), "echo");
        assert!(EchoServer.server_description().is_none());
    }
}
