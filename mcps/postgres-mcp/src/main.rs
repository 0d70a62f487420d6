//! Postgres MCP - read-only PostgreSQL queries and schema inspection
//!
//! Connection settings come from flags or `DB_HOST`, `DB_PORT`, `DB_NAME`,
//! `DB_USER` and `DB_PASSWORD`.

use clap::Parser;
use postgres_mcp::{DbConfig, PostgresMcpServer};

mcp_common::serve_stdio!(PostgresMcpServer::new(DbConfig::parse()), "postgres_mcp");
