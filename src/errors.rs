//! Error types for the Nordic crate
//!
//! This module contains all error types that can be returned by engine operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NordicError {
    #[error(transparent)]
    Store(#[from] table_access::StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid entity: {0}")]
    InvalidEntity(String),
}

pub type NordicResult<T> = Result<T, NordicError>;
