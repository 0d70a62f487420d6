//! Query executor
//!
//! Each operation opens its own connection, runs one validated statement or
//! fixed catalog queries, and drops the connection before returning. Nothing
//! is shared between calls except the immutable connection settings.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

use crate::catalog::{self, DEFAULT_SCHEMA};
use crate::config::DbConfig;
use crate::guard::{self, Verdict};
use crate::normalize::row_to_object;
use crate::types::{
    describe_pg_error, ColumnDescriptor, HealthState, HealthStatus, IndexColumn, PgMcpError,
    SchemaColumn, TableSchema,
};

pub type ExecResult<T> = Result<T, PgMcpError>;

/// A connection scoped to one call
///
/// Dropping the session stops the connection task, which closes the socket,
/// so every return path (including `?`) releases the connection.
struct Session {
    client: Client,
    driver: JoinHandle<()>,
}

impl Session {
    async fn open(config: &tokio_postgres::Config) -> ExecResult<Self> {
        let (client, connection) = config
            .connect(NoTls)
            .await
            .map_err(PgMcpError::Connection)?;

        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("Connection error: {}", e);
            }
        });

        tracing::debug!("Database connection established");
        Ok(Self { client, driver })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.driver.abort();
        tracing::debug!("Database connection released");
    }
}

/// Runs the server's operations against the configured database
#[derive(Clone)]
pub struct Executor {
    config: DbConfig,
    pg_config: tokio_postgres::Config,
}

impl Executor {
    pub fn new(config: DbConfig) -> Self {
        let pg_config = config.to_pg_config();
        Self { config, pg_config }
    }

    async fn session(&self) -> ExecResult<Session> {
        Session::open(&self.pg_config).await
    }

    /// Validate and run client-supplied SQL, returning one object per row
    ///
    /// A rejected query never opens a connection.
    pub async fn run_select(&self, sql: &str) -> ExecResult<Vec<Map<String, Value>>> {
        if let Verdict::Reject(rejection) = guard::validate(sql) {
            return Err(PgMcpError::Rejected(rejection));
        }

        tracing::info!("Executing query: {}", sql);

        let session = self.session().await?;
        let rows = session.client.query(sql, &[]).await.map_err(|e| {
            tracing::error!("Error executing query: {}", describe_pg_error(&e));
            PgMcpError::Database(e)
        })?;

        let objects = rows
            .iter()
            .map(row_to_object)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(rows = objects.len(), "Query completed");
        Ok(objects)
    }

    /// Base tables in `schema`; an unknown schema simply has none
    pub async fn list_tables(&self, schema: Option<&str>) -> ExecResult<Vec<String>> {
        let schema = schema.unwrap_or(DEFAULT_SCHEMA);
        let session = self.session().await?;
        let rows = session.client.query(catalog::LIST_TABLES, &[&schema]).await?;

        let tables = rows
            .iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(schema, count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// User schemas, without `pg_catalog`, `information_schema`, and `pg_*`
    pub async fn list_schemas(&self) -> ExecResult<Vec<String>> {
        let session = self.session().await?;
        let rows = session.client.query(catalog::LIST_SCHEMAS, &[]).await?;

        let schemas = rows
            .iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!(count = schemas.len(), "Listed schemas");
        Ok(schemas)
    }

    /// Every column of every table in `schema`
    pub async fn get_schema(&self, schema: Option<&str>) -> ExecResult<Vec<SchemaColumn>> {
        let schema = schema.unwrap_or(DEFAULT_SCHEMA);
        let session = self.session().await?;
        let columns = fetch_columns(&session.client, schema, None).await?;

        tracing::info!(schema, count = columns.len(), "Fetched schema columns");
        Ok(columns
            .into_iter()
            .map(|(table, column)| catalog::schema_column(table, column))
            .collect())
    }

    /// `table -> {columns, indexes}` for every table in `schema`
    pub async fn get_schema_with_indexes(
        &self,
        schema: Option<&str>,
    ) -> ExecResult<BTreeMap<String, TableSchema>> {
        let schema = schema.unwrap_or(DEFAULT_SCHEMA);
        let session = self.session().await?;
        let columns = fetch_columns(&session.client, schema, None).await?;
        let indexes = fetch_indexes(&session.client, schema, None).await?;

        let assembled = catalog::assemble_schema(columns, indexes);
        tracing::info!(schema, tables = assembled.len(), "Found tables in schema");
        Ok(assembled)
    }

    /// Columns of one table; a table with no columns is reported missing
    pub async fn get_table_schema(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> ExecResult<Vec<ColumnDescriptor>> {
        let schema = schema.unwrap_or(DEFAULT_SCHEMA);
        let session = self.session().await?;
        let columns = fetch_columns(&session.client, schema, Some(table)).await?;

        if columns.is_empty() {
            return Err(not_found(schema, table));
        }
        Ok(columns.into_iter().map(|(_, column)| column).collect())
    }

    pub async fn get_table_schema_with_indexes(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> ExecResult<TableSchema> {
        let schema = schema.unwrap_or(DEFAULT_SCHEMA);
        let session = self.session().await?;
        let columns = fetch_columns(&session.client, schema, Some(table)).await?;
        if columns.is_empty() {
            return Err(not_found(schema, table));
        }
        let indexes = fetch_indexes(&session.client, schema, Some(table)).await?;

        Ok(TableSchema {
            columns: columns.into_iter().map(|(_, column)| column).collect(),
            indexes: catalog::group_indexes(indexes.into_iter().map(|(_, index)| index)),
        })
    }

    /// One entry per (index, column); empty when the table has no indexes
    pub async fn get_table_indexes(
        &self,
        table: &str,
        schema: Option<&str>,
    ) -> ExecResult<Vec<IndexColumn>> {
        let schema = schema.unwrap_or(DEFAULT_SCHEMA);
        let session = self.session().await?;

        let exists: bool = session
            .client
            .query_one(catalog::TABLE_EXISTS, &[&schema, &table])
            .await?
            .try_get(0)?;
        if !exists {
            return Err(not_found(schema, table));
        }

        let indexes = fetch_indexes(&session.client, schema, Some(table)).await?;
        Ok(indexes.into_iter().map(|(_, index)| index).collect())
    }

    /// Connect and ask for the server version; failures are reported in the
    /// status rather than as an error
    pub async fn health_check(&self) -> HealthStatus {
        match self.server_version().await {
            Ok(version) => HealthStatus {
                status: HealthState::Success,
                message: format!(
                    "Connected to {} ({})",
                    self.config.target(),
                    version
                ),
            },
            Err(e) => {
                tracing::warn!("Health check failed: {}", e);
                HealthStatus {
                    status: HealthState::Error,
                    message: e.to_string(),
                }
            }
        }
    }

    async fn server_version(&self) -> ExecResult<String> {
        let session = self.session().await?;
        let row = session.client.query_one(catalog::SERVER_VERSION, &[]).await?;
        Ok(row.try_get(0)?)
    }
}

fn not_found(schema: &str, table: &str) -> PgMcpError {
    tracing::warn!(schema, table, "Table not found");
    PgMcpError::TableNotFound {
        schema: schema.to_string(),
        table: table.to_string(),
    }
}

async fn fetch_columns(
    client: &Client,
    schema: &str,
    table: Option<&str>,
) -> ExecResult<Vec<(String, ColumnDescriptor)>> {
    let rows = client.query(catalog::COLUMNS, &[&schema, &table]).await?;
    Ok(rows
        .iter()
        .map(catalog::column_from_row)
        .collect::<Result<Vec<_>, _>>()?)
}

async fn fetch_indexes(
    client: &Client,
    schema: &str,
    table: Option<&str>,
) -> ExecResult<Vec<(String, IndexColumn)>> {
    let rows = client.query(catalog::INDEXES, &[&schema, &table]).await?;
    Ok(rows
        .iter()
        .map(catalog::index_from_row)
        .collect::<Result<Vec<_>, _>>()?)
}
