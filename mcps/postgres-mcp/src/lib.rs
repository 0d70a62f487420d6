//! Postgres MCP Library
//!
//! Read-only access to a PostgreSQL database over MCP. Client SQL passes a
//! keyword guard before it reaches the database, and every result value is
//! normalized to plain JSON.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use postgres_mcp::{DbConfig, PostgresMcpServer};
//!
//! let server = PostgresMcpServer::new(DbConfig::default());
//! // Serve via stdio or call tools in-process through EmbeddableMcp
//! ```

pub mod catalog;
pub mod config;
pub mod executor;
pub mod guard;
pub mod handlers;
pub mod normalize;
pub mod params;
pub mod server;
pub mod types;

pub use config::DbConfig;
pub use executor::Executor;
pub use guard::{validate, Rejection, Verdict};
pub use server::PostgresMcpServer;
pub use types::{HealthState, HealthStatus, PgMcpError};

// Re-export parameter types for direct API usage
pub use params::*;
