//! Database capability used by [`Connection`](super::Connection)

use async_trait::async_trait;
use type_mapping::{FieldDescription, Row};

use crate::errors::StoreResult;
use crate::query_builder::Query;

/// Transaction control statements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatement {
    Begin,
    Commit,
    Rollback,
}

impl TransactionStatement {
    pub fn as_sql(&self) -> &'static str {
        match self {
            TransactionStatement::Begin => "BEGIN",
            TransactionStatement::Commit => "COMMIT",
            TransactionStatement::Rollback => "ROLLBACK",
        }
    }
}

/// Rows of one statement plus the driver-reported type of every field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    pub rows: Vec<Row>,
    pub fields: Vec<FieldDescription>,
}

impl RawResult {
    pub fn new(rows: Vec<Row>, fields: Vec<FieldDescription>) -> Self {
        Self { rows, fields }
    }
}

/// One physical database connection.
///
/// Implementations never track transaction state themselves; the
/// connection decides when to send `BEGIN`, `COMMIT` and `ROLLBACK`.
#[async_trait]
pub trait DatabaseDriver: Send {
    async fn connect(&mut self) -> StoreResult<()>;

    async fn disconnect(&mut self) -> StoreResult<()>;

    async fn execute(&mut self, query: &Query) -> StoreResult<RawResult>;

    async fn execute_transaction_statement(
        &mut self,
        statement: TransactionStatement,
    ) -> StoreResult<()>;
}
