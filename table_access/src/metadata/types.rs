use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::errors::{StoreError, StoreResult};

/// One column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnMetadata {
    pub name: String,
    /// False when the column is nullable
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// `information_schema.columns.data_type`, e.g. `integer` or `ARRAY`
    pub data_type: String,
    /// `pg_type.oid` of the column type
    #[serde(default)]
    pub data_type_id: u32,
    /// `pg_type.typname`, e.g. `int4` or `_text`
    #[serde(default)]
    pub data_type_alias: String,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, data_type_id: u32) -> Self {
        let data_type = data_type.into();
        Self {
            name: name.into(),
            required: false,
            primary_key: false,
            data_type_alias: data_type.clone(),
            data_type,
            data_type_id,
        }
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Mark as primary-key column; primary keys are always required
    pub fn with_primary_key(mut self) -> Self {
        self.primary_key = true;
        self.required = true;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.data_type_alias = alias.into();
        self
    }

    pub fn is_array(&self) -> bool {
        type_mapping::is_array_data_type(&self.data_type)
    }

    /// Type to cast a bound `value` to when it travels as text.
    ///
    /// Strings on scalar columns and string lists on array columns bind as
    /// `text`/`text[]`; other shapes already carry a server type.
    pub fn parameter_cast(&self, value: &serde_json::Value) -> Option<&str> {
        use serde_json::Value;
        let textual = match value {
            Value::String(_) => !self.is_array(),
            Value::Array(items) => self.is_array() && items.iter().all(Value::is_string),
            _ => false,
        };
        if textual {
            type_mapping::text_parameter_cast(&self.data_type_alias)
        } else {
            None
        }
    }
}

/// One physical table, identified by `(schema, name)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    #[serde(default)]
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnMetadata>,
}

impl TableMetadata {
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        columns: Vec<ColumnMetadata>,
    ) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns,
        }
    }

    /// `schema.name` as it appears in generated SQL
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_keys(&self) -> Vec<&ColumnMetadata> {
        self.columns.iter().filter(|c| c.primary_key).collect()
    }

    pub fn has_primary_key(&self) -> bool {
        self.columns.iter().any(|c| c.primary_key)
    }
}

/// Catalog snapshot: tables grouped by schema plus the type-id dictionary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseMetadata {
    #[serde(default)]
    pub schemas: BTreeMap<String, Vec<TableMetadata>>,
    /// `pg_type.oid` to `data_type` name
    #[serde(default)]
    pub data_types: BTreeMap<u32, String>,
}

impl DatabaseMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table under its schema, registering its column types
    pub fn insert_table(&mut self, table: TableMetadata) {
        for column in &table.columns {
            self.data_types
                .entry(column.data_type_id)
                .or_insert_with(|| column.data_type.clone());
        }
        let tables = self.schemas.entry(table.schema.clone()).or_default();
        match tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => *existing = table,
            None => tables.push(table),
        }
    }

    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.insert_table(table);
        self
    }

    pub fn find_table(&self, schema: &str, table: &str) -> Option<&TableMetadata> {
        self.schemas
            .get(schema)
            .and_then(|tables| tables.iter().find(|t| t.name == table))
    }

    /// Look up one table, failing with [`StoreError::MetadataNotFound`]
    pub fn table(&self, schema: &str, table: &str) -> StoreResult<&TableMetadata> {
        self.find_table(schema, table)
            .ok_or_else(|| StoreError::MetadataNotFound {
                schema: schema.to_string(),
                table: table.to_string(),
            })
    }

    pub fn table_for(&self, context: &EntityContext) -> StoreResult<&TableMetadata> {
        self.table(&context.schema, &context.table)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableMetadata> {
        self.schemas.values().flatten()
    }

    pub fn table_count(&self) -> usize {
        self.schemas.values().map(Vec::len).sum()
    }

    pub fn data_type(&self, type_id: u32) -> Option<&str> {
        self.data_types.get(&type_id).map(String::as_str)
    }

    /// Type ids whose declared data type is the array family
    pub fn array_type_ids(&self) -> BTreeSet<u32> {
        self.data_types
            .iter()
            .filter(|(_, name)| type_mapping::is_array_data_type(name))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Restore the catalog invariants after loading a document: every table
    /// carries the schema it is filed under and every column type id has an
    /// entry in `data_types`.
    pub fn normalize(&mut self) {
        for (schema, tables) in self.schemas.iter_mut() {
            for table in tables.iter_mut() {
                if table.schema.is_empty() {
                    table.schema = schema.clone();
                }
                for column in &table.columns {
                    self.data_types
                        .entry(column.data_type_id)
                        .or_insert_with(|| column.data_type.clone());
                }
            }
        }
    }
}

/// Resolved `(schema, table)` pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityContext {
    pub schema: String,
    pub table: String,
}

impl EntityContext {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Table in the default schema
    pub fn in_default_schema(table: impl Into<String>) -> Self {
        Self::new(config::DEFAULT_SCHEMA, table)
    }
}

impl std::fmt::Display for EntityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Where the catalog comes from; exactly one source is used
#[derive(Debug, Clone)]
pub enum MetadataSource {
    /// Query `information_schema` for the listed schemas
    Introspect { schemas: Vec<String> },
    /// Use a pre-built document as is
    Document(DatabaseMetadata),
}

impl Default for MetadataSource {
    fn default() -> Self {
        MetadataSource::Introspect {
            schemas: vec![config::DEFAULT_SCHEMA.to_string()],
        }
    }
}
