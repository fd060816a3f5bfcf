//! Query builder utilities
//!
//! This module turns one table's metadata plus value and condition maps
//! into parameterized single-table SQL.

pub mod builder;
pub mod expressions;
pub mod query;
pub mod sql_generation;


pub use builder::QueryBuilder;
pub use expressions::{
    ColumnExpression, ColumnExpressions, FunctionCall, ManagedTimestamp, Operation,
    RenderedExpression,
};
pub use query::Query;
pub use sql_generation::SqlGenerator;
