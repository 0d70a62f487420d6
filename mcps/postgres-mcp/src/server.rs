//! MCP Server implementation for read-only PostgreSQL access
//!
//! Tools are thin wrappers; behavior lives in the handlers and executor.

use mcp_common::{
    async_trait, CallToolResult, EmbeddableError, EmbeddableMcp, EmbeddableResult, McpError,
};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo, Tool},
    tool, tool_handler, tool_router,
};
use serde_json::Value;

use crate::config::DbConfig;
use crate::executor::Executor;
use crate::handlers;
use crate::params::*;

/// The PostgreSQL MCP Server
#[derive(Clone)]
pub struct PostgresMcpServer {
    executor: Executor,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Tool Router - Each tool delegates to its handler
// ============================================================================

#[tool_router]
impl PostgresMcpServer {
    /// Create a server for the given connection settings
    pub fn new(config: DbConfig) -> Self {
        tracing::info!("Using database {}", config.target());
        Self {
            executor: Executor::new(config),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Execute a read-only SQL query and return the rows as a JSON array of \
        objects keyed by column name. Queries containing data-modifying keywords are rejected.")]
    async fn query_data(
        &self,
        Parameters(params): Parameters<QueryParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::query_data(&self.executor, params).await
    }

    #[tool(description = "List the tables in a schema (default 'public')")]
    async fn list_tables(
        &self,
        Parameters(params): Parameters<SchemaParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::list_tables(&self.executor, params).await
    }

    #[tool(description = "List the schemas in the database, excluding system schemas")]
    async fn list_schemas(&self) -> Result<CallToolResult, McpError> {
        handlers::list_schemas(&self.executor).await
    }

    #[tool(description = "Get every column of every table in a schema: table, column, type, \
        nullable and default")]
    async fn get_schema(
        &self,
        Parameters(params): Parameters<SchemaParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::get_schema(&self.executor, params).await
    }

    #[tool(description = "Get the schema of a whole schema as a map from table name to its \
        columns and indexes")]
    async fn get_schema_with_indexes(
        &self,
        Parameters(params): Parameters<SchemaParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::get_schema_with_indexes(&self.executor, params).await
    }

    #[tool(description = "Get the columns of one table: order, column, type, nullable, default \
        and comment")]
    async fn get_table_schema(
        &self,
        Parameters(params): Parameters<TableParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::get_table_schema(&self.executor, params).await
    }

    #[tool(description = "Get the columns and indexes of one table")]
    async fn get_table_schema_with_indexes(
        &self,
        Parameters(params): Parameters<TableParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::get_table_schema_with_indexes(&self.executor, params).await
    }

    #[tool(description = "List the indexes of one table, one entry per indexed column")]
    async fn get_table_indexes(
        &self,
        Parameters(params): Parameters<TableParams>,
    ) -> Result<CallToolResult, McpError> {
        handlers::get_table_indexes(&self.executor, params).await
    }

    #[tool(description = "Check that the database is reachable")]
    async fn health_check(&self) -> Result<CallToolResult, McpError> {
        handlers::health_check(&self.executor).await
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for PostgresMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Read-only PostgreSQL MCP server. Use list_schemas and list_tables to explore, \
                 get_schema / get_table_schema (optionally with indexes) to inspect structure, \
                 and query_data to run read-only SQL. Results are JSON text; failures are \
                 JSON objects with an 'error' field."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

impl Default for PostgresMcpServer {
    fn default() -> Self {
        Self::new(DbConfig::default())
    }
}

// ============================================================================
// EmbeddableMcp Implementation
// ============================================================================

#[async_trait]
impl EmbeddableMcp for PostgresMcpServer {
    fn server_name(&self) -> &str {
        "postgres"
    }

    fn server_description(&self) -> Option<&str> {
        Some("Read-only PostgreSQL query and schema inspection")
    }

    fn list_tools(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    async fn call_tool(&self, name: &str, params: Value) -> EmbeddableResult<CallToolResult> {
        match name {
            "query_data" => {
                let params: QueryParams = serde_json::from_value(params)?;
                self.query_data(Parameters(params)).await.map_err(Into::into)
            }

            "list_tables" => {
                let params: SchemaParams = serde_json::from_value(params)?;
                self.list_tables(Parameters(params)).await.map_err(Into::into)
            }

            "list_schemas" => self.list_schemas().await.map_err(Into::into),

            "get_schema" => {
                let params: SchemaParams = serde_json::from_value(params)?;
                self.get_schema(Parameters(params)).await.map_err(Into::into)
            }

            "get_schema_with_indexes" => {
                let params: SchemaParams = serde_json::from_value(params)?;
                self.get_schema_with_indexes(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            "get_table_schema" => {
                let params: TableParams = serde_json::from_value(params)?;
                self.get_table_schema(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            "get_table_schema_with_indexes" => {
                let params: TableParams = serde_json::from_value(params)?;
                self.get_table_schema_with_indexes(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            "get_table_indexes" => {
                let params: TableParams = serde_json::from_value(params)?;
                self.get_table_indexes(Parameters(params))
                    .await
                    .map_err(Into::into)
            }

            "health_check" => self.health_check().await.map_err(Into::into),

            _ => Err(EmbeddableError::ToolNotFound(name.to_string())),
        }
    }
}
