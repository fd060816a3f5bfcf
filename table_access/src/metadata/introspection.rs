//! Catalog introspection
//!
//! Two queries describe the whole catalog: one enumerates the tables of the
//! requested schemas, the other returns every column of those tables with
//! its primary-key flag and type id. [`assemble`] turns the rows into a
//! [`DatabaseMetadata`] without touching the database.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::types::{ColumnMetadata, DatabaseMetadata, TableMetadata};
use crate::connection::Connection;
use crate::errors::StoreResult;
use crate::query_builder::Query;
use type_mapping::Row;

pub const FIND_TABLES_SQL: &str = "\
SELECT table_schema::text AS table_schema, table_name::text AS table_name \
FROM information_schema.tables \
WHERE table_schema::text = ANY($1::text[]) \
ORDER BY table_schema, table_name";

pub const FIND_COLUMNS_SQL: &str = "\
SELECT c.table_schema::text AS table_schema, \
c.table_name::text AS table_name, \
c.column_name::text AS column_name, \
c.is_nullable::text AS is_nullable, \
c.data_type::text AS data_type, \
(pk.column_name IS NOT NULL) AS is_primary, \
t.oid::int8 AS data_type_id, \
c.udt_name::text AS data_type_alias \
FROM information_schema.columns c \
JOIN unnest($1::text[], $2::text[]) AS wanted(table_schema, table_name) \
ON c.table_schema::text = wanted.table_schema AND c.table_name::text = wanted.table_name \
LEFT JOIN (\
SELECT ku.table_schema, ku.table_name, ku.column_name \
FROM information_schema.table_constraints tc \
JOIN information_schema.key_column_usage ku \
ON tc.constraint_name = ku.constraint_name \
AND tc.constraint_schema = ku.constraint_schema \
AND tc.table_schema = ku.table_schema \
AND tc.table_name = ku.table_name \
WHERE tc.constraint_type = 'PRIMARY KEY'\
) pk ON c.table_schema = pk.table_schema AND c.table_name = pk.table_name AND c.column_name = pk.column_name \
JOIN pg_catalog.pg_namespace n ON n.nspname = c.udt_schema::text \
JOIN pg_catalog.pg_type t ON t.typnamespace = n.oid AND t.typname = c.udt_name::text \
ORDER BY c.table_schema, c.table_name, c.ordinal_position";

/// A row of the table enumeration query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub table_schema: String,
    pub table_name: String,
}

impl TableRow {
    pub fn new(table_schema: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            table_schema: table_schema.into(),
            table_name: table_name.into(),
        }
    }
}

/// A row of the column enumeration query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRow {
    pub table_schema: String,
    pub table_name: String,
    pub column_name: String,
    /// `YES` or `NO`
    pub is_nullable: String,
    pub data_type: String,
    pub is_primary: bool,
    pub data_type_id: u32,
    pub data_type_alias: String,
}

impl ColumnRow {
    fn into_column(self) -> ColumnMetadata {
        ColumnMetadata {
            name: self.column_name,
            required: self.is_nullable != "YES",
            primary_key: self.is_primary,
            data_type: self.data_type,
            data_type_id: self.data_type_id,
            data_type_alias: self.data_type_alias,
        }
    }
}

/// Group column rows under their tables and tables under their schemas.
///
/// Tables keep the order of `tables`, columns the order of `columns`.
/// Columns of tables missing from `tables` are dropped.
pub fn assemble(tables: Vec<TableRow>, columns: Vec<ColumnRow>) -> DatabaseMetadata {
    let mut by_table: HashMap<(String, String), Vec<ColumnMetadata>> = HashMap::new();
    let mut metadata = DatabaseMetadata::new();

    for row in columns {
        metadata
            .data_types
            .entry(row.data_type_id)
            .or_insert_with(|| row.data_type.clone());
        let key = (row.table_schema.clone(), row.table_name.clone());
        by_table.entry(key).or_default().push(row.into_column());
    }

    for table in tables {
        let columns = by_table
            .remove(&(table.table_schema.clone(), table.table_name.clone()))
            .unwrap_or_default();
        metadata
            .schemas
            .entry(table.table_schema.clone())
            .or_default()
            .push(TableMetadata::new(table.table_schema, table.table_name, columns));
    }

    metadata
}

/// Runs the introspection queries over a connection
pub struct CatalogIntrospector<'a> {
    connection: &'a mut Connection,
}

impl<'a> CatalogIntrospector<'a> {
    pub fn new(connection: &'a mut Connection) -> Self {
        Self { connection }
    }

    pub async fn find_tables(&mut self, schemas: &[String]) -> StoreResult<Vec<TableRow>> {
        let schemas: Vec<String> = if schemas.is_empty() {
            vec![config::DEFAULT_SCHEMA.to_string()]
        } else {
            schemas.to_vec()
        };
        let query = Query::new(FIND_TABLES_SQL, vec![json!(schemas)]);
        let rows = self.connection.query(&query).await?;
        decode_rows(rows)
    }

    pub async fn find_columns(&mut self, tables: &[TableRow]) -> StoreResult<Vec<ColumnRow>> {
        if tables.is_empty() {
            return Ok(Vec::new());
        }
        let schemas: Vec<&str> = tables.iter().map(|t| t.table_schema.as_str()).collect();
        let names: Vec<&str> = tables.iter().map(|t| t.table_name.as_str()).collect();
        let query = Query::new(FIND_COLUMNS_SQL, vec![json!(schemas), json!(names)]);
        let rows = self.connection.query(&query).await?;
        decode_rows(rows)
    }

    /// Introspect the given schemas into a fresh catalog
    pub async fn build(&mut self, schemas: &[String]) -> StoreResult<DatabaseMetadata> {
        let tables = self.find_tables(schemas).await?;
        let columns = self.find_columns(&tables).await?;
        tracing::debug!(
            "[CATALOG] introspected {} tables, {} columns",
            tables.len(),
            columns.len()
        );
        Ok(assemble(tables, columns))
    }
}

fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<Row>) -> StoreResult<Vec<T>> {
    rows.into_iter()
        .map(|row| Ok(serde_json::from_value(Value::Object(row))?))
        .collect()
}
