//! Convenience re-exports for common table-access usage

pub use crate::codec::DataCodec;
pub use crate::connection::{Connection, DatabaseDriver, PgDriver, SharedConnection};
pub use crate::dao::{Dao, InsertItems};
pub use crate::errors::{StoreError, StoreResult};
pub use crate::metadata::{
    ColumnMetadata, DatabaseMetadata, EntityContext, MetadataSource, TableMetadata,
};
pub use crate::query_builder::{
    ColumnExpression, ColumnExpressions, FunctionCall, ManagedTimestamp, Operation, Query,
};
pub use type_mapping::Row;
