//! Integration tests for postgres-mcp
//!
//! These tests run against a live PostgreSQL server configured through the
//! usual `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER` and `DB_PASSWORD`
//! variables. Values come from literals and tables from `pg_catalog`, so
//! any database works. The index test creates and drops its own schema,
//! `postgres_mcp_it_indexes`, through the driver directly.
//!
//! # Running tests
//!
//! ```bash
//! docker run --rm -e POSTGRES_PASSWORD=postgres -p 5432:5432 postgres:16
//! cargo test -p postgres-mcp --test integration -- --ignored
//! ```

use clap::Parser;
use mcp_common::{first_text, EmbeddableMcp};
use postgres_mcp::{DbConfig, Executor, HealthState, PgMcpError, PostgresMcpServer};
use serde_json::{json, Value};
use tokio_postgres::NoTls;

fn config() -> DbConfig {
    DbConfig::parse_from(["postgres-mcp", "--connect-timeout-secs", "5"])
}

/// Executor for the configured database, or `None` when it is unreachable
async fn live_executor() -> Option<Executor> {
    let executor = Executor::new(config());
    let health = executor.health_check().await;
    if health.status != HealthState::Success {
        eprintln!("Skipping: PostgreSQL not available ({})", health.message);
        return None;
    }
    Some(executor)
}

// ============================================================================
// QUERY TESTS
// ============================================================================

#[tokio::test]
#[ignore = "integration test - requires PostgreSQL"]
async fn query_normalizes_column_types() {
    let Some(executor) = live_executor().await else {
        return;
    };

    let rows = executor
        .run_select(
            "SELECT 1::int4 AS id, \
                    12345678901234567890.0001::numeric AS amount, \
                    'a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11'::uuid AS uid, \
                    '2024-03-01 12:30:00+00'::timestamptz AS at, \
                    '2024-03-01'::date AS day, \
                    '\\xdeadbeef'::bytea AS blob, \
                    '{\"k\": [1, 2]}'::jsonb AS doc, \
                    ARRAY[[1, 2], [3, 4]]::int4[] AS grid, \
                    NULL::text AS missing, \
                    true AS flag",
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row["id"], json!(1));
    assert_eq!(row["amount"], json!("12345678901234567890.0001"));
    assert_eq!(row["uid"], json!("a0eebc99-9c0b-4ef8-bb6d-6bb9bd380a11"));
    assert_eq!(row["at"], json!("2024-03-01T12:30:00+00:00"));
    assert_eq!(row["day"], json!("2024-03-01"));
    assert_eq!(row["blob"], json!("3q2+7w=="));
    assert_eq!(row["doc"], json!({ "k": [1, 2] }));
    assert_eq!(row["grid"], json!([[1, 2], [3, 4]]));
    assert_eq!(row["missing"], Value::Null);
    assert_eq!(row["flag"], json!(true));
}

#[tokio::test]
#[ignore = "integration test - requires PostgreSQL"]
async fn query_preserves_column_order() {
    let Some(executor) = live_executor().await else {
        return;
    };

    let rows = executor
        .run_select("SELECT 3 AS zeta, 2 AS alpha, 1 AS mid")
        .await
        .unwrap();

    let keys: Vec<&str> = rows[0].keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
}

#[tokio::test]
#[ignore = "integration test - requires PostgreSQL"]
async fn query_with_no_rows_is_empty_array() {
    let Some(executor) = live_executor().await else {
        return;
    };

    let rows = executor
        .run_select("SELECT relname FROM pg_catalog.pg_class WHERE false")
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
#[ignore = "integration test - requires PostgreSQL"]
async fn query_syntax_error_is_database_error() {
    let Some(executor) = live_executor().await else {
        return;
    };

    let err = executor.run_select("SELEC 1").await.unwrap_err();
    assert!(matches!(err, PgMcpError::Database(_)));
    assert!(err.to_string().contains("syntax error"), "{}", err);
}

// ============================================================================
// CATALOG TESTS
// ============================================================================

#[tokio::test]
#[ignore = "integration test - requires PostgreSQL"]
async fn list_schemas_hides_system_schemas() {
    let Some(executor) = live_executor().await else {
        return;
    };

    let schemas = executor.list_schemas().await.unwrap();
    assert!(schemas.iter().any(|s| s == "public"));
    assert!(!schemas.iter().any(|s| s == "information_schema" || s.starts_with("pg_")));
}

#[tokio::test]
#[ignore = "integration test - requires PostgreSQL"]
async fn list_tables_in_unknown_schema_is_empty() {
    let Some(executor) = live_executor().await else {
        return;
    };

    let tables = executor
        .list_tables(Some("no_such_schema_for_tests"))
        .await
        .unwrap();
    assert!(tables.is_empty());
}

#[tokio::test]
#[ignore = "integration test - requires PostgreSQL"]
async fn table_schema_of_catalog_table() {
    let Some(executor) = live_executor().await else {
        return;
    };

    let columns = executor
        .get_table_schema("pg_class", Some("pg_catalog"))
        .await
        .unwrap();
    assert_eq!(columns[0].order, 1);
    assert!(columns.iter().any(|c| c.column == "relname" && c.data_type == "name"));

    let indexes = executor
        .get_table_indexes("pg_class", Some("pg_catalog"))
        .await
        .unwrap();
    assert!(indexes
        .iter()
        .any(|i| i.index_name == "pg_class_oid_index" && i.column == "oid" && i.is_unique));
}

#[tokio::test]
#[ignore = "integration test - requires PostgreSQL"]
async fn expression_index_keys_are_reported() {
    let Some(executor) = live_executor().await else {
        return;
    };

    let (client, connection) = config().to_pg_config().connect(NoTls).await.unwrap();
    let driver = tokio::spawn(connection);
    client
        .batch_execute(
            "DROP SCHEMA IF EXISTS postgres_mcp_it_indexes CASCADE;
             CREATE SCHEMA postgres_mcp_it_indexes;
             CREATE TABLE postgres_mcp_it_indexes.people (id int4 PRIMARY KEY, name text);
             CREATE INDEX people_lower_name_idx
                 ON postgres_mcp_it_indexes.people (lower(name), id);",
        )
        .await
        .unwrap();

    let outcome = executor
        .get_table_schema_with_indexes("people", Some("postgres_mcp_it_indexes"))
        .await;

    client
        .batch_execute("DROP SCHEMA postgres_mcp_it_indexes CASCADE")
        .await
        .unwrap();
    drop(client);
    let _ = driver.await;

    let schema = outcome.unwrap();
    let index = schema
        .indexes
        .iter()
        .find(|i| i.index_name == "people_lower_name_idx")
        .unwrap();
    assert_eq!(index.columns, vec!["lower(name)", "id"]);
    assert!(!index.is_unique);

    let pkey = schema.indexes.iter().find(|i| i.is_primary).unwrap();
    assert_eq!(pkey.columns, vec!["id"]);
}

#[tokio::test]
#[ignore = "integration test - requires PostgreSQL"]
async fn missing_table_is_not_found() {
    let Some(executor) = live_executor().await else {
        return;
    };

    let err = executor
        .get_table_schema("missing_table_for_tests", None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Table 'public.missing_table_for_tests' not found");

    let err = executor
        .get_table_indexes("missing_table_for_tests", None)
        .await
        .unwrap_err();
    assert!(matches!(err, PgMcpError::TableNotFound { .. }));
}

// ============================================================================
// TOOL TESTS
// ============================================================================

#[tokio::test]
#[ignore = "integration test - requires PostgreSQL"]
async fn tool_health_check_succeeds() {
    if live_executor().await.is_none() {
        return;
    }

    let server = PostgresMcpServer::new(config());
    let result = server.call_tool("health_check", json!({})).await.unwrap();
    let body: Value = serde_json::from_str(first_text(&result).unwrap()).unwrap();
    assert_eq!(body["status"], "success");
}

#[tokio::test]
#[ignore = "integration test - requires PostgreSQL"]
async fn tool_query_data_returns_rows() {
    if live_executor().await.is_none() {
        return;
    }

    let server = PostgresMcpServer::new(config());
    let result = server
        .call_tool("query_data", json!({ "sql": "SELECT 42 AS answer" }))
        .await
        .unwrap();

    assert!(!result.is_error.unwrap_or(false));
    let body: Value = serde_json::from_str(first_text(&result).unwrap()).unwrap();
    assert_eq!(body, json!([{ "answer": 42 }]));
}
