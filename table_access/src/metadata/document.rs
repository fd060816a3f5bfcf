//! Persisted catalog documents
//!
//! The document is the JSON form of [`DatabaseMetadata`]: `schemas` maps a
//! schema name to its tables, `dataTypes` maps stringified type ids to type
//! names, column fields are camelCase.

use std::path::Path;

use super::types::DatabaseMetadata;
use crate::errors::{StoreError, StoreResult};

impl DatabaseMetadata {
    /// Parse a document and normalize it
    pub fn from_json_str(document: &str) -> StoreResult<Self> {
        let mut metadata: DatabaseMetadata = serde_json::from_str(document)
            .map_err(|e| StoreError::MetadataDocument(format!("invalid document: {}", e)))?;
        metadata.normalize();
        Ok(metadata)
    }

    /// Read and parse a document file
    pub fn from_path(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let document = std::fs::read_to_string(path).map_err(|e| {
            StoreError::MetadataDocument(format!("cannot read {}: {}", path.display(), e))
        })?;
        tracing::debug!("[CATALOG] loading metadata document {}", path.display());
        Self::from_json_str(&document)
    }

    pub fn to_json_pretty(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the document to `path`, replacing any existing file
    pub fn write_to_path(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        let document = self.to_json_pretty()?;
        std::fs::write(path, document).map_err(|e| {
            StoreError::MetadataDocument(format!("cannot write {}: {}", path.display(), e))
        })
    }
}
