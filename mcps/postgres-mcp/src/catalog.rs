//! Fixed catalog queries
//!
//! Schema and table names are always bound as `$n::text` parameters. The
//! casts keep the driver's parameter types plain `text` instead of the
//! `information_schema` domain types, and the selected columns are cast so
//! they decode into ordinary Rust types.

use std::collections::BTreeMap;

use tokio_postgres::Row;

use crate::types::{ColumnDescriptor, IndexColumn, IndexDescriptor, SchemaColumn, TableSchema};

/// Schema used when a tool call names none
pub const DEFAULT_SCHEMA: &str = "public";

pub const LIST_TABLES: &str = r#"
SELECT table_name::text
FROM information_schema.tables
WHERE table_schema = $1::text
  AND table_type = 'BASE TABLE'
ORDER BY table_name
"#;

pub const LIST_SCHEMAS: &str = r#"
SELECT schema_name::text
FROM information_schema.schemata
WHERE schema_name NOT IN ('pg_catalog', 'information_schema')
  AND schema_name NOT LIKE 'pg\_%'
ORDER BY schema_name
"#;

pub const TABLE_EXISTS: &str = r#"
SELECT EXISTS (
    SELECT 1
    FROM information_schema.tables
    WHERE table_schema = $1::text
      AND table_name = $2::text
)
"#;

/// Columns of every table in a schema; `$2` optionally narrows to one table
pub const COLUMNS: &str = r#"
SELECT
    c.table_name::text AS table_name,
    c.ordinal_position::int4 AS ordinal,
    c.column_name::text AS column_name,
    c.data_type::text AS data_type,
    (c.is_nullable = 'YES') AS nullable,
    c.column_default::text AS column_default,
    pg_catalog.col_description(cls.oid, c.ordinal_position::int4)::text AS comment
FROM information_schema.columns c
JOIN pg_catalog.pg_namespace ns ON ns.nspname = c.table_schema
JOIN pg_catalog.pg_class cls ON cls.relname = c.table_name AND cls.relnamespace = ns.oid
WHERE c.table_schema = $1::text
  AND ($2::text IS NULL OR c.table_name = $2::text)
ORDER BY c.table_name, c.ordinal_position
"#;

/// Index keys of every table in a schema, in key order; `$2` optionally
/// narrows to one table. Expression keys have no attribute and are reported
/// by their definition text.
pub const INDEXES: &str = r#"
SELECT
    t.relname::text AS table_name,
    i.relname::text AS index_name,
    COALESCE(
        a.attname::text,
        pg_catalog.pg_get_indexdef(ix.indexrelid, k.pos::int4, true)
    ) AS column_name,
    ix.indisunique AS is_unique,
    ix.indisprimary AS is_primary
FROM pg_catalog.pg_class t
JOIN pg_catalog.pg_index ix ON t.oid = ix.indrelid
JOIN pg_catalog.pg_class i ON i.oid = ix.indexrelid
JOIN pg_catalog.pg_namespace n ON n.oid = t.relnamespace
CROSS JOIN LATERAL unnest(ix.indkey::int2[]) WITH ORDINALITY AS k(attnum, pos)
LEFT JOIN pg_catalog.pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum AND k.attnum > 0
WHERE n.nspname = $1::text
  AND ($2::text IS NULL OR t.relname = $2::text)
ORDER BY t.relname, i.relname, k.pos
"#;

pub const SERVER_VERSION: &str = "SELECT version()";

/// Column row paired with the table it belongs to
pub fn column_from_row(row: &Row) -> Result<(String, ColumnDescriptor), tokio_postgres::Error> {
    let table = row.try_get("table_name")?;
    let column = ColumnDescriptor {
        order: row.try_get("ordinal")?,
        column: row.try_get("column_name")?,
        data_type: row.try_get("data_type")?,
        nullable: row.try_get("nullable")?,
        default: row.try_get("column_default")?,
        comment: row.try_get("comment")?,
    };
    Ok((table, column))
}

/// Index row paired with the table it belongs to
pub fn index_from_row(row: &Row) -> Result<(String, IndexColumn), tokio_postgres::Error> {
    let table = row.try_get("table_name")?;
    let index = IndexColumn {
        index_name: row.try_get("index_name")?,
        column: row.try_get("column_name")?,
        is_unique: row.try_get("is_unique")?,
        is_primary: row.try_get("is_primary")?,
    };
    Ok((table, index))
}

pub fn schema_column(table: String, column: ColumnDescriptor) -> SchemaColumn {
    SchemaColumn {
        table,
        column: column.column,
        data_type: column.data_type,
        nullable: column.nullable,
        default: column.default,
    }
}

/// Collapse per-column index rows into one descriptor per index, keeping the
/// order in which indexes first appear
pub fn group_indexes(rows: impl IntoIterator<Item = IndexColumn>) -> Vec<IndexDescriptor> {
    let mut indexes: Vec<IndexDescriptor> = Vec::new();
    for row in rows {
        match indexes.iter_mut().find(|i| i.index_name == row.index_name) {
            Some(existing) => existing.columns.push(row.column),
            None => indexes.push(IndexDescriptor {
                index_name: row.index_name,
                columns: vec![row.column],
                is_unique: row.is_unique,
                is_primary: row.is_primary,
            }),
        }
    }
    indexes
}

/// Assemble `table -> {columns, indexes}`; indexes of tables that have no
/// column rows are dropped
pub fn assemble_schema(
    columns: impl IntoIterator<Item = (String, ColumnDescriptor)>,
    indexes: impl IntoIterator<Item = (String, IndexColumn)>,
) -> BTreeMap<String, TableSchema> {
    let mut schema: BTreeMap<String, TableSchema> = BTreeMap::new();
    for (table, column) in columns {
        schema.entry(table).or_default().columns.push(column);
    }

    let mut index_rows: BTreeMap<String, Vec<IndexColumn>> = BTreeMap::new();
    for (table, index) in indexes {
        if schema.contains_key(&table) {
            index_rows.entry(table).or_default().push(index);
        }
    }
    for (table, rows) in index_rows {
        if let Some(entry) = schema.get_mut(&table) {
            entry.indexes = group_indexes(rows);
        }
    }

    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(order: i32, name: &str) -> ColumnDescriptor {
        ColumnDescriptor {
            order,
            column: name.to_string(),
            data_type: "integer".to_string(),
            nullable: order != 1,
            default: None,
            comment: None,
        }
    }

    fn index(name: &str, column: &str, unique: bool, primary: bool) -> IndexColumn {
        IndexColumn {
            index_name: name.to_string(),
            column: column.to_string(),
            is_unique: unique,
            is_primary: primary,
        }
    }

    #[test]
    fn test_group_indexes_merges_columns() {
        let grouped = group_indexes(vec![
            index("orders_pkey", "id", true, true),
            index("orders_customer_created_idx", "customer_id", false, false),
            index("orders_customer_created_idx", "created_at", false, false),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].index_name, "orders_pkey");
        assert_eq!(grouped[0].columns, vec!["id"]);
        assert!(grouped[0].is_primary);
        assert_eq!(grouped[1].columns, vec!["customer_id", "created_at"]);
        assert!(!grouped[1].is_unique);
    }

    #[test]
    fn test_assemble_schema() {
        let columns = vec![
            ("orders".to_string(), column(1, "id")),
            ("orders".to_string(), column(2, "customer_id")),
            ("users".to_string(), column(1, "id")),
        ];
        let indexes = vec![
            ("orders".to_string(), index("orders_pkey", "id", true, true)),
            ("users".to_string(), index("users_pkey", "id", true, true)),
            ("ghost".to_string(), index("ghost_pkey", "id", true, true)),
        ];

        let schema = assemble_schema(columns, indexes);

        assert_eq!(schema.keys().collect::<Vec<_>>(), vec!["orders", "users"]);
        assert_eq!(schema["orders"].columns.len(), 2);
        assert_eq!(schema["orders"].indexes[0].index_name, "orders_pkey");
        assert_eq!(schema["users"].indexes.len(), 1);
        assert!(!schema.contains_key("ghost"));
    }

    #[test]
    fn test_table_without_indexes_has_empty_list() {
        let schema = assemble_schema(vec![("logs".to_string(), column(1, "line"))], vec![]);
        assert!(schema["logs"].indexes.is_empty());
    }

    #[test]
    fn test_schema_column_projection() {
        let projected = schema_column("users".to_string(), column(2, "email"));
        assert_eq!(projected.table, "users");
        assert_eq!(projected.column, "email");
        assert!(projected.nullable);
    }
}
