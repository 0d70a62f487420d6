//! MCP Common - shared plumbing for MCP servers
//!
//! - **Initialization**: [`init_tracing`] and the `serve_stdio!` macro
//! - **Results**: JSON rendering of tool results, including error objects
//! - **Embeddable**: [`EmbeddableMcp`] for in-process tool calls
//!
//! ```rust,ignore
//! mcp_common::serve_stdio!(MyServer::new(config), "my_mcp");
//!
//! async fn my_tool(&self) -> Result<CallToolResult, McpError> {
//!     match self.fetch().await {
//!         Ok(data) => json_success(&data),
//!         Err(e) => json_error(e.to_string()),
//!     }
//! }
//! ```

pub mod embeddable;
pub mod init;
pub mod result;

pub use embeddable::{EmbeddableError, EmbeddableMcp, EmbeddableResult};
pub use init::{init_tracing, LogFormat};
pub use result::{first_text, json_error, json_message, json_success};

pub use rmcp::{
    model::{CallToolResult, Content, Tool},
    ErrorData as McpError,
};

pub use async_trait::async_trait;
