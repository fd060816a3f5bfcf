//! Table-bound CRUD facade
//!
//! A [`Dao`] binds one table's metadata to the shared connection. Reads run
//! outside any transaction; writes join the connection's open write
//! transaction. Arguments are given in the object key convention and every
//! returned row is converted back to it.


use std::sync::Arc;

use serde_json::Value;
use type_mapping::Row;

use crate::codec::DataCodec;
use crate::connection::SharedConnection;
use crate::errors::{StoreError, StoreResult};
use crate::metadata::TableMetadata;
use crate::query_builder::{ColumnExpressions, Query, QueryBuilder};

/// One item or a batch for [`Dao::create`]
#[derive(Debug, Clone, PartialEq)]
pub enum InsertItems {
    One(Row),
    Many(Vec<Row>),
}

impl InsertItems {
    pub fn into_vec(self) -> Vec<Row> {
        match self {
            InsertItems::One(item) => vec![item],
            InsertItems::Many(items) => items,
        }
    }
}

impl From<Row> for InsertItems {
    fn from(item: Row) -> Self {
        InsertItems::One(item)
    }
}

impl From<Vec<Row>> for InsertItems {
    fn from(items: Vec<Row>) -> Self {
        InsertItems::Many(items)
    }
}

#[derive(Debug, Clone)]
pub struct Dao {
    builder: QueryBuilder,
    connection: SharedConnection,
    codec: DataCodec,
}

impl Dao {
    pub fn new(table: Arc<TableMetadata>, connection: SharedConnection, codec: DataCodec) -> Self {
        Self {
            builder: QueryBuilder::new(table),
            connection,
            codec,
        }
    }

    pub fn with_expressions(mut self, expressions: ColumnExpressions) -> Self {
        self.builder = self.builder.with_expressions(expressions);
        self
    }

    pub fn table(&self) -> &TableMetadata {
        self.builder.table()
    }

    pub fn codec(&self) -> &DataCodec {
        &self.codec
    }

    pub fn query_builder(&self) -> &QueryBuilder {
        &self.builder
    }

    pub async fn find_all(&self) -> StoreResult<Vec<Row>> {
        let query = self.builder.select_all()?;
        self.read(&query).await
    }

    pub async fn find(&self, conditions: Row) -> StoreResult<Vec<Row>> {
        let conditions = self.codec.row_from_object(conditions);
        let query = self.builder.select_with_conditions(&conditions)?;
        self.read(&query).await
    }

    /// At most one matching row; more than one is an error
    pub async fn find_one(&self, conditions: Row) -> StoreResult<Option<Row>> {
        let rows = self.find(conditions).await?;
        if rows.len() > 1 {
            return Err(StoreError::MultipleRows {
                table: self.table().qualified_name(),
                count: rows.len(),
            });
        }
        Ok(rows.into_iter().next())
    }

    pub async fn count(&self, conditions: Row) -> StoreResult<i64> {
        let conditions = self.codec.row_from_object(conditions);
        let query = self.builder.count_with_conditions(&conditions)?;
        let rows = self.connection.lock().await.query(&query).await?;
        match rows.into_iter().next().and_then(|mut row| row.remove("count")) {
            Some(count) => Ok(serde_json::from_value(count)?),
            None => Ok(0),
        }
    }

    pub async fn create(&self, items: impl Into<InsertItems>) -> StoreResult<Vec<Row>> {
        let items: Vec<Row> = items
            .into()
            .into_vec()
            .into_iter()
            .map(|item| self.codec.row_from_object(item))
            .collect();
        let query = self.builder.insert(&items)?;
        self.write(&query).await
    }

    /// Update the row identified by the item's primary-key values
    pub async fn update(&self, item: Row) -> StoreResult<Vec<Row>> {
        let item = self.codec.row_from_object(item);
        let conditions = self.primary_key_conditions(&item, "update")?;
        self.update_rows(item, conditions).await
    }

    pub async fn update_with_conditions(&self, item: Row, conditions: Row) -> StoreResult<Vec<Row>> {
        let item = self.codec.row_from_object(item);
        let conditions = self.codec.row_from_object(conditions);
        self.update_rows(item, conditions).await
    }

    /// Delete the row identified by the item's primary-key values
    pub async fn delete(&self, item: Row) -> StoreResult<Vec<Row>> {
        let item = self.codec.row_from_object(item);
        let conditions = self.primary_key_conditions(&item, "delete")?;
        let query = self.builder.delete(&conditions)?;
        self.write(&query).await
    }

    pub async fn delete_with_conditions(&self, conditions: Row) -> StoreResult<Vec<Row>> {
        let conditions = self.codec.row_from_object(conditions);
        let query = self.builder.delete(&conditions)?;
        self.write(&query).await
    }

    async fn update_rows(&self, mut values: Row, conditions: Row) -> StoreResult<Vec<Row>> {
        // condition columns are matched on, never rewritten
        for key in conditions.keys() {
            values.shift_remove(key);
        }
        let query = self.builder.update(&values, &conditions)?;
        self.write(&query).await
    }

    /// Conditions on the primary-key columns, taken from a row-convention item
    fn primary_key_conditions(&self, item: &Row, operation: &str) -> StoreResult<Row> {
        let table = self.table();
        let keys = table.primary_keys();
        if keys.is_empty() {
            return Err(StoreError::MissingPrimaryKey {
                table: table.qualified_name(),
                operation: operation.to_string(),
            });
        }

        let present = |name: &str| matches!(item.get(name), Some(value) if !value.is_null());

        let missing: Vec<String> = keys
            .iter()
            .filter(|key| key.required && !present(&key.name))
            .map(|key| key.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::MissingRequiredKey {
                columns: missing,
                operation: operation.to_string(),
            });
        }

        let conditions: Row = keys
            .iter()
            .filter(|key| present(&key.name))
            .map(|key| (key.name.clone(), item.get(&key.name).cloned().unwrap_or(Value::Null)))
            .collect();
        if conditions.is_empty() {
            return Err(StoreError::MissingRequiredKey {
                columns: keys.iter().map(|key| key.name.clone()).collect(),
                operation: operation.to_string(),
            });
        }
        Ok(conditions)
    }

    async fn read(&self, query: &Query) -> StoreResult<Vec<Row>> {
        let rows = self.connection.lock().await.query(query).await?;
        Ok(self.objects(rows))
    }

    async fn write(&self, query: &Query) -> StoreResult<Vec<Row>> {
        let rows = self
            .connection
            .lock()
            .await
            .query_with_transaction(query)
            .await?;
        Ok(self.objects(rows))
    }

    fn objects(&self, rows: Vec<Row>) -> Vec<Row> {
        rows.into_iter()
            .map(|row| self.codec.object_from_row(row))
            .collect()
    }
}
