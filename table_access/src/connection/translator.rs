//! Result translation
//!
//! Drivers that return PostgreSQL arrays in their text form are decoded here:
//! every field whose type id is an `ARRAY` type in the catalog has its
//! `{a,b,c}` literal turned into a JSON list.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use type_mapping::{parse_array_literal, Row};

use super::driver::RawResult;
use crate::metadata::DatabaseMetadata;

#[derive(Debug, Clone, Default)]
pub struct ResultTranslator {
    metadata: Option<Arc<DatabaseMetadata>>,
    array_type_ids: BTreeSet<u32>,
}

impl ResultTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metadata(metadata: Arc<DatabaseMetadata>) -> Self {
        let mut translator = Self::new();
        translator.attach(metadata);
        translator
    }

    pub fn attach(&mut self, metadata: Arc<DatabaseMetadata>) {
        self.array_type_ids = metadata.array_type_ids();
        self.metadata = Some(metadata);
    }

    pub fn detach(&mut self) {
        self.metadata = None;
        self.array_type_ids.clear();
    }

    pub fn has_metadata(&self) -> bool {
        self.metadata.is_some()
    }

    pub fn translate(&self, result: RawResult) -> Vec<Row> {
        if self.metadata.is_none() || self.array_type_ids.is_empty() {
            return result.rows;
        }

        let array_fields: Vec<&str> = result
            .fields
            .iter()
            .filter(|field| self.array_type_ids.contains(&field.type_id))
            .map(|field| field.name.as_str())
            .collect();
        if array_fields.is_empty() {
            return result.rows;
        }

        result
            .rows
            .into_iter()
            .map(|mut row| {
                for name in &array_fields {
                    if let Some(value) = row.get_mut(*name) {
                        decode_array_value(value);
                    }
                }
                row
            })
            .collect()
    }
}

fn decode_array_value(value: &mut Value) {
    let Value::String(text) = value else {
        return;
    };
    if text.is_empty() {
        return;
    }
    if let Some(elements) = parse_array_literal(text) {
        *value = Value::Array(
            elements
                .into_iter()
                .map(|element| element.map(Value::String).unwrap_or(Value::Null))
                .collect(),
        );
    }
}
