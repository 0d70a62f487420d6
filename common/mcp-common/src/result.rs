//! Tool result rendering
//!
//! Every payload leaves the server as pretty-printed JSON text. Failures are
//! still tool results (flagged `is_error`) carrying `{"error": "..."}`, so a
//! client always receives a JSON document it can parse.

use rmcp::{
    model::{CallToolResult, Content},
    ErrorData as McpError,
};
use serde::Serialize;

/// Body of an error result
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
}

/// Body of an informational result that carries no data
#[derive(Debug, Serialize)]
pub struct MessageBody<'a> {
    pub message: &'a str,
}

fn to_json<T: Serialize + ?Sized>(data: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(data).map_err(|e| McpError::internal_error(e.to_string(), None))
}

/// Successful result with `data` rendered as pretty-printed JSON text
///
/// # Arguments
///
/// * `data` - Any type that implements `Serialize`
///
/// # Returns
///
/// * `Ok(CallToolResult)` with one text content item
/// * `Err(McpError)` if serialization fails
pub fn json_success<T: Serialize + ?Sized>(data: &T) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(to_json(data)?)]))
}

/// Error result carrying `{"error": message}`
///
/// The result is flagged `is_error`, so clients see a failed tool call whose
/// text is still a JSON document.
///
/// # Arguments
///
/// * `message` - Human-readable reason, usually an error's `Display` text
///
/// # Example
///
/// ```rust,ignore
/// use mcp_common::{json_error, json_success};
///
/// async fn my_tool(&self) -> Result<CallToolResult, McpError> {
///     match self.fetch().await {
///         Ok(rows) => json_success(&rows),
///         Err(e) => json_error(e.to_string()),
///     }
/// }
/// ```
pub fn json_error(message: impl AsRef<str>) -> Result<CallToolResult, McpError> {
    let body = ErrorBody {
        error: message.as_ref(),
    };
    Ok(CallToolResult::error(vec![Content::text(to_json(&body)?)]))
}

/// Successful result carrying `{"message": message}`
///
/// For calls that succeed but have no data to return.
///
/// # Arguments
///
/// * `message` - Text placed in the `message` field
///
/// # Example
///
/// ```rust,ignore
/// use mcp_common::json_message;
///
/// if indexes.is_empty() {
///     return json_message(format!("No indexes found for table '{}'", table));
/// }
/// ```
pub fn json_message(message: impl AsRef<str>) -> Result<CallToolResult, McpError> {
    json_success(&MessageBody {
        message: message.as_ref(),
    })
}

/// Text of the first content item, if it is text
///
/// Mostly useful in tests and embedding hosts that call tools in-process.
///
/// # Arguments
///
/// * `result` - A tool result, successful or not
///
/// # Example
///
/// ```rust,ignore
/// use mcp_common::{first_text, EmbeddableMcp};
///
/// let result = server.call_tool("health_check", serde_json::json!({})).await?;
/// let body: serde_json::Value = serde_json::from_str(first_text(&result).unwrap_or("{}"))?;
/// ```
pub fn first_text(result: &CallToolResult) -> Option<&str> {
    result
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_json_success() {
        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };
        let result = json_success(&data).unwrap();
        assert!(!result.is_error.unwrap_or(false));

        let parsed: serde_json::Value = serde_json::from_str(first_text(&result).unwrap()).unwrap();
        assert_eq!(parsed["name"], "test");
        assert_eq!(parsed["value"], 42);
    }

    #[test]
    fn test_json_error_is_flagged() {
        let result = json_error("relation \"users\" does not exist").unwrap();
        assert_eq!(result.is_error, Some(true));

        let parsed: serde_json::Value = serde_json::from_str(first_text(&result).unwrap()).unwrap();
        assert_eq!(parsed["error"], "relation \"users\" does not exist");
    }

    #[test]
    fn test_json_message() {
        let result = json_message("nothing here").unwrap();
        assert!(!result.is_error.unwrap_or(false));

        let parsed: serde_json::Value = serde_json::from_str(first_text(&result).unwrap()).unwrap();
        assert_eq!(parsed, serde_json::json!({ "message": "nothing here" }));
    }
}
