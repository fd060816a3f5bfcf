//! Table Access - schema-driven data access for PostgreSQL
//!
//! This crate holds the catalog, the query builder, the key-case codec, the
//! connection with its transaction state machine and the table-bound [`Dao`].

pub mod codec;
pub mod connection;
pub mod dao;
pub mod errors;
pub mod metadata;
pub mod prelude;
pub mod query_builder;
pub mod validation;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use codec::{DataCodec, KeyTransform};
pub use connection::{
    Connection, ConnectionState, DatabaseDriver, PgDriver, RawResult, ResultTranslator,
    SharedConnection, TransactionStatement,
};
pub use dao::{Dao, InsertItems};
pub use errors::{StoreError, StoreResult};
pub use metadata::{
    CatalogIntrospector, ColumnMetadata, DatabaseMetadata, EntityContext, MetadataSource,
    TableMetadata,
};
pub use query_builder::{
    ColumnExpression, ColumnExpressions, FunctionCall, ManagedTimestamp, Operation, Query,
    QueryBuilder, RenderedExpression,
};
pub use type_mapping::{FieldDescription, Row};
pub use validation::{sql_identifier, ValidationError};
