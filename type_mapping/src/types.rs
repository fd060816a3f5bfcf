//! Shared value types
//!
//! Rows travel through the engine as ordered JSON maps so that column
//! order survives every transformation.

use serde::{Deserialize, Serialize};

/// A record keyed by column (or property) name
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Name and PostgreSQL type oid of one result column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescription {
    pub name: String,
    #[serde(rename = "dataTypeID")]
    pub type_id: u32,
}

impl FieldDescription {
    pub fn new(name: impl Into<String>, type_id: u32) -> Self {
        Self {
            name: name.into(),
            type_id,
        }
    }
}
