//! Parameter types for postgres MCP tools

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct QueryParams {
    #[schemars(description = "SQL query to execute. Must not contain data-modifying keywords \
        (INSERT, UPDATE, DELETE, CREATE, DROP, ALTER, TRUNCATE, GRANT, REVOKE, COPY, MERGE), \
        even inside identifiers")]
    #[serde(alias = "sql_query")]
    pub sql: String,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct SchemaParams {
    #[schemars(description = "Schema name (optional, defaults to 'public')")]
    #[serde(default)]
    pub schema: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TableParams {
    #[schemars(description = "Table name")]
    pub table: String,

    #[schemars(description = "Schema name (optional, defaults to 'public')")]
    #[serde(default)]
    pub schema: Option<String>,
}
