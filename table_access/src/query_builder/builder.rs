//! Query builder for single-table statements

use std::sync::Arc;

use serde_json::Value;

use super::expressions::{ColumnExpressions, Operation};
use super::query::Query;
use super::sql_generation::SqlGenerator;
use crate::errors::{StoreError, StoreResult};
use crate::metadata::TableMetadata;
use crate::validation::sql_identifier;
use type_mapping::Row;

/// Builds SELECT, COUNT, INSERT, UPDATE and DELETE statements for one table.
///
/// Placeholders are numbered from `$1`, left to right: SET or VALUES first,
/// then WHERE. Every schema, table and column name is validated before it is
/// written into the statement, and double-quoted when it is a reserved
/// keyword or has upper-case letters.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    table: Arc<TableMetadata>,
    expressions: ColumnExpressions,
}

impl QueryBuilder {
    pub fn new(table: Arc<TableMetadata>) -> Self {
        Self {
            table,
            expressions: ColumnExpressions::new(),
        }
    }

    pub fn with_expressions(mut self, expressions: ColumnExpressions) -> Self {
        self.expressions = expressions;
        self
    }

    pub fn table(&self) -> &TableMetadata {
        &self.table
    }

    pub fn expressions(&self) -> &ColumnExpressions {
        &self.expressions
    }

    fn qualified_name(&self) -> StoreResult<String> {
        Ok(format!(
            "{}.{}",
            sql_identifier(&self.table.schema)?,
            sql_identifier(&self.table.name)?
        ))
    }

    fn from_clause(&self) -> StoreResult<String> {
        Ok(format!(
            "{} AS {}",
            self.qualified_name()?,
            sql_identifier(&self.table.name)?
        ))
    }

    pub fn select_all(&self) -> StoreResult<Query> {
        self.select_with_conditions(&Row::new())
    }

    pub fn select_with_conditions(&self, conditions: &Row) -> StoreResult<Query> {
        let mut generator = SqlGenerator::new(&self.table);
        let from = self.from_clause()?;
        let where_clause = generator.where_clause(conditions)?;
        let sql = format!("SELECT * FROM {}{}", from, where_clause);
        tracing::debug!("[SELECT] SQL: {}", sql);
        Ok(generator.finish(sql))
    }

    pub fn count_with_conditions(&self, conditions: &Row) -> StoreResult<Query> {
        let mut generator = SqlGenerator::new(&self.table);
        let from = self.from_clause()?;
        let where_clause = generator.where_clause(conditions)?;
        let sql = format!("SELECT COUNT(*) AS count FROM {}{}", from, where_clause);
        tracing::debug!("[COUNT] SQL: {}", sql);
        Ok(generator.finish(sql))
    }

    /// Multi-row insert over the union of the items' keys.
    ///
    /// Items lacking a column bind `NULL` for it. Managed insert columns are
    /// appended when no item names them.
    pub fn insert(&self, items: &[Row]) -> StoreResult<Query> {
        let table = self.qualified_name()?;
        if items.is_empty() {
            return Err(StoreError::EmptyInsert { table });
        }

        let columns = self.write_columns(items.iter(), Operation::Insert)?;
        let names = quoted(&columns)?;
        let mut generator = SqlGenerator::new(&self.table);

        let sql = if columns.is_empty() {
            if items.len() == 1 {
                format!("INSERT INTO {} DEFAULT VALUES RETURNING *", table)
            } else {
                let rows = vec!["(DEFAULT)"; items.len()].join(", ");
                format!("INSERT INTO {} VALUES {} RETURNING *", table, rows)
            }
        } else {
            let rows: Vec<String> = items
                .iter()
                .map(|item| {
                    let values: Vec<String> = columns
                        .iter()
                        .map(|column| {
                            let value = item.get(column).cloned().unwrap_or(Value::Null);
                            generator.column_value(&self.expressions, column, Operation::Insert, value)
                        })
                        .collect();
                    format!("({})", values.join(", "))
                })
                .collect();
            format!(
                "INSERT INTO {} ({}) VALUES {} RETURNING *",
                table,
                names.join(", "),
                rows.join(", ")
            )
        };

        tracing::debug!("[INSERT] SQL: {} ({} rows)", sql, items.len());
        Ok(generator.finish(sql))
    }

    /// `UPDATE ... SET ... WHERE ... RETURNING *`; without conditions the
    /// whole table is updated.
    pub fn update(&self, values: &Row, conditions: &Row) -> StoreResult<Query> {
        let table = self.qualified_name()?;
        let columns = self.write_columns(std::iter::once(values), Operation::Update)?;
        if columns.is_empty() {
            return Err(StoreError::EmptyUpdate { table });
        }

        let names = quoted(&columns)?;
        let mut generator = SqlGenerator::new(&self.table);
        let assignments: Vec<String> = columns
            .iter()
            .zip(&names)
            .map(|(column, name)| {
                let value = values.get(column).cloned().unwrap_or(Value::Null);
                let rendered =
                    generator.column_value(&self.expressions, column, Operation::Update, value);
                format!("{} = {}", name, rendered)
            })
            .collect();
        let where_clause = generator.where_clause(conditions)?;

        let sql = format!(
            "UPDATE {} SET {}{} RETURNING *",
            table,
            assignments.join(", "),
            where_clause
        );
        tracing::debug!("[UPDATE] SQL: {}", sql);
        Ok(generator.finish(sql))
    }

    pub fn delete(&self, conditions: &Row) -> StoreResult<Query> {
        let table = self.qualified_name()?;
        let mut generator = SqlGenerator::new(&self.table);
        let where_clause = generator.where_clause(conditions)?;
        let sql = format!("DELETE FROM {}{} RETURNING *", table, where_clause);
        tracing::debug!("[DELETE] SQL: {}", sql);
        Ok(generator.finish(sql))
    }

    /// Union of keys in first-seen order, then managed columns
    fn write_columns<'r>(
        &self,
        items: impl Iterator<Item = &'r Row>,
        operation: Operation,
    ) -> StoreResult<Vec<String>> {
        let mut columns: Vec<String> = Vec::new();
        for item in items {
            for key in item.keys() {
                if !columns.iter().any(|c| c == key) {
                    sql_identifier(key)?;
                    columns.push(key.clone());
                }
            }
        }
        for managed in self.expressions.managed_columns(operation) {
            if !columns.iter().any(|c| c == managed) {
                sql_identifier(managed)?;
                columns.push(managed.to_string());
            }
        }
        Ok(columns)
    }
}

fn quoted(columns: &[String]) -> StoreResult<Vec<String>> {
    columns
        .iter()
        .map(|column| Ok(sql_identifier(column)?))
        .collect()
}
