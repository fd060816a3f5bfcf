//! Database catalog
//!
//! The catalog describes every table of the configured schemas: its columns,
//! their nullability, primary-key membership and PostgreSQL type. It is built
//! from `information_schema` or loaded from a persisted JSON document.

mod document;
mod introspection;
mod types;


pub use introspection::{assemble, CatalogIntrospector, ColumnRow, TableRow, FIND_COLUMNS_SQL, FIND_TABLES_SQL};
pub use types::{ColumnMetadata, DatabaseMetadata, EntityContext, MetadataSource, TableMetadata};
