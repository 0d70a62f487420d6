//! Type definitions for postgres MCP

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::guard::Rejection;

// ============================================================================
// Response Types
// ============================================================================

/// One column of a schema-wide listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub table: String,
    pub column: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

/// One column of a single table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// 1-based ordinal position
    pub order: i32,
    pub column: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub comment: Option<String>,
}

/// One (index, column) pair as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub index_name: String,
    pub column: String,
    pub is_unique: bool,
    pub is_primary: bool,
}

/// An index with its columns in key order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub index_name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
    pub is_primary: bool,
}

/// Columns and indexes of one table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Success,
    Error,
}

/// Result of the health check tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: HealthState,
    pub message: String,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum PgMcpError {
    #[error("{0}")]
    Rejected(Rejection),

    #[error("Table '{schema}.{table}' not found")]
    TableNotFound { schema: String, table: String },

    #[error("Failed to connect to database: {}", describe_pg_error(.0))]
    Connection(#[source] tokio_postgres::Error),

    #[error("Database error: {}", describe_pg_error(.0))]
    Database(#[from] tokio_postgres::Error),
}

/// Server-reported errors carry severity, message, detail and hint; prefer
/// those over the driver's generic "db error" text
pub fn describe_pg_error(err: &tokio_postgres::Error) -> String {
    let Some(db) = err.as_db_error() else {
        return err.to_string();
    };

    let mut text = format!("{}: {}", db.severity(), db.message());
    if let Some(detail) = db.detail() {
        text.push_str(&format!(" (detail: {})", detail));
    }
    if let Some(hint) = db.hint() {
        text.push_str(&format!(" (hint: {})", hint));
    }
    text
}
