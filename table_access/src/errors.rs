use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No metadata for table {schema}.{table}")]
    MetadataNotFound { schema: String, table: String },

    #[error("Expected at most one row from {table}, found {count}")]
    MultipleRows { table: String, count: usize },

    #[error("Table {table} has no primary key, cannot {operation} without conditions")]
    MissingPrimaryKey { table: String, operation: String },

    #[error("Missing required key(s) [{}] for {operation}", .columns.join(", "))]
    MissingRequiredKey {
        columns: Vec<String>,
        operation: String,
    },

    #[error("Insert into {table} needs at least one item")]
    EmptyInsert { table: String },

    #[error("Update of {table} has no columns to set")]
    EmptyUpdate { table: String },

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] ValidationError),

    #[error("Metadata document error: {0}")]
    MetadataDocument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Execution(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
