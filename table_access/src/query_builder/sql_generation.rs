//! Placeholder bookkeeping and WHERE clause generation

use serde_json::Value;

use super::expressions::{ColumnExpressions, Operation};
use super::query::Query;
use crate::errors::StoreResult;
use crate::metadata::TableMetadata;
use crate::validation::sql_identifier;
use type_mapping::Row;

/// Accumulates bound values for one statement against `table`; the next
/// placeholder is always `$(values.len() + 1)`.
///
/// Strings bound for a catalogued column of a type text does not reach on
/// its own (`uuid`, `timestamptz`, `date`, enums, ...) get a `$n::type`
/// cast. Columns missing from the catalog bind bare.
#[derive(Debug)]
pub struct SqlGenerator<'t> {
    table: &'t TableMetadata,
    values: Vec<Value>,
}

impl<'t> SqlGenerator<'t> {
    pub fn new(table: &'t TableMetadata) -> Self {
        Self {
            table,
            values: Vec::new(),
        }
    }

    pub fn next_placeholder(&self) -> String {
        format!("${}", self.values.len() + 1)
    }

    /// Bind `value` for `column` and return its placeholder, cast if needed
    pub fn push(&mut self, column: &str, value: Value) -> String {
        let placeholder = self.next_placeholder();
        let cast = self
            .table
            .column(column)
            .and_then(|meta| meta.parameter_cast(&value))
            .map(str::to_string);
        self.values.push(value);
        match cast {
            Some(type_name) => format!("{}::{}", placeholder, type_name),
            None => placeholder,
        }
    }

    /// Render the value of `column` for a write, honouring its expression
    pub fn column_value(
        &mut self,
        expressions: &ColumnExpressions,
        column: &str,
        operation: Operation,
        value: Value,
    ) -> String {
        match expressions.get(column) {
            Some(expression) => {
                let rendered = expression.render_expression(operation, &self.next_placeholder());
                if rendered.consumes_value {
                    self.values.push(value);
                }
                rendered.sql
            }
            None => self.push(column, value),
        }
    }

    /// ` WHERE k1 = $i AND k2 IN ($j, $k)`, or an empty string without
    /// conditions. An empty list matches nothing.
    pub fn where_clause(&mut self, conditions: &Row) -> StoreResult<String> {
        if conditions.is_empty() {
            return Ok(String::new());
        }

        let mut parts = Vec::with_capacity(conditions.len());
        for (column, value) in conditions {
            let name = sql_identifier(column)?;
            let part = match value {
                Value::Array(items) if items.is_empty() => "1=0".to_string(),
                Value::Array(items) => {
                    let placeholders: Vec<String> = items
                        .iter()
                        .map(|item| self.push(column, item.clone()))
                        .collect();
                    format!("{} IN ({})", name, placeholders.join(", "))
                }
                other => format!("{} = {}", name, self.push(column, other.clone())),
            };
            parts.push(part);
        }

        Ok(format!(" WHERE {}", parts.join(" AND ")))
    }

    pub fn finish(self, text: String) -> Query {
        Query::new(text, self.values)
    }
}
