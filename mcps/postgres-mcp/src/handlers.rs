//! Tool handlers
//!
//! Each handler runs one executor operation and renders the outcome: data as
//! JSON text, failures as a `{"error": ...}` result. Only a response that
//! cannot be serialized becomes an MCP protocol error.

use mcp_common::{json_error, json_message, json_success, CallToolResult, McpError};
use serde::Serialize;

use crate::executor::{ExecResult, Executor};
use crate::params::*;

fn render<T: Serialize>(outcome: ExecResult<T>) -> Result<CallToolResult, McpError> {
    match outcome {
        Ok(data) => json_success(&data),
        Err(e) => json_error(e.to_string()),
    }
}

pub async fn query_data(
    executor: &Executor,
    params: QueryParams,
) -> Result<CallToolResult, McpError> {
    render(executor.run_select(&params.sql).await)
}

pub async fn list_tables(
    executor: &Executor,
    params: SchemaParams,
) -> Result<CallToolResult, McpError> {
    render(executor.list_tables(params.schema.as_deref()).await)
}

pub async fn list_schemas(executor: &Executor) -> Result<CallToolResult, McpError> {
    render(executor.list_schemas().await)
}

pub async fn get_schema(
    executor: &Executor,
    params: SchemaParams,
) -> Result<CallToolResult, McpError> {
    render(executor.get_schema(params.schema.as_deref()).await)
}

pub async fn get_schema_with_indexes(
    executor: &Executor,
    params: SchemaParams,
) -> Result<CallToolResult, McpError> {
    render(
        executor
            .get_schema_with_indexes(params.schema.as_deref())
            .await,
    )
}

pub async fn get_table_schema(
    executor: &Executor,
    params: TableParams,
) -> Result<CallToolResult, McpError> {
    render(
        executor
            .get_table_schema(&params.table, params.schema.as_deref())
            .await,
    )
}

pub async fn get_table_schema_with_indexes(
    executor: &Executor,
    params: TableParams,
) -> Result<CallToolResult, McpError> {
    render(
        executor
            .get_table_schema_with_indexes(&params.table, params.schema.as_deref())
            .await,
    )
}

pub async fn get_table_indexes(
    executor: &Executor,
    params: TableParams,
) -> Result<CallToolResult, McpError> {
    let schema = params
        .schema
        .as_deref()
        .unwrap_or(crate::catalog::DEFAULT_SCHEMA);

    match executor.get_table_indexes(&params.table, Some(schema)).await {
        Ok(indexes) if indexes.is_empty() => json_message(format!(
            "No indexes found for table '{}.{}'",
            schema, params.table
        )),
        outcome => render(outcome),
    }
}

pub async fn health_check(executor: &Executor) -> Result<CallToolResult, McpError> {
    json_success(&executor.health_check().await)
}
