//! # Nordic
//!
//! Schema-driven data access for PostgreSQL. Nordic reads the shape of your
//! tables from the database catalog, builds parameterized SQL for them and
//! runs it over a single managed connection.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nordic::prelude::*;
//! use serde_json::json;
//!
//! #[derive(Entity)]
//! #[entity(schema = "secured", table = "articles")]
//! pub struct Article;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let nordic = Nordic::from_config(&config)?;
//!
//!     let users = nordic.get_dao("users").await?;
//!     let created = users
//!         .create(row(json!({"firstName": "Ada", "lastName": "Lovelace"})))
//!         .await?;
//!     println!("Created: {:?}", created);
//!
//!     let articles = nordic.get_dao_for::<Article>().await?;
//!     println!("Articles: {}", articles.count(Row::new()).await?);
//!
//!     nordic.shutdown(true).await?;
//!     Ok(())
//! }
//! ```

extern crate self as nordic;

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod entity;
pub mod errors;
pub mod prelude;
pub mod raw_query;

pub use crate::core::{Nordic, NordicBuilder};
pub use entity::{Entity, EntityDescriptor, EntityIdentifier};
pub use errors::{NordicError, NordicResult};
pub use raw_query::compile_named_query;

pub use config::{AppConfig, DatabaseConfig, EngineConfig, KeyCase, TimestampPolicy};
pub use entity_derive::Entity;

// Re-export internal crates used by the public API
pub use config;
pub use signal_system;
pub use table_access;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;

/// Take the object out of a JSON value; anything else becomes an empty row.
pub fn row(value: serde_json::Value) -> table_access::Row {
    match value {
        serde_json::Value::Object(map) => map,
        _ => table_access::Row::new(),
    }
}
