//! Statement event types
//!
//! This module defines what an observer sees for each statement
//! flowing through a connection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a statement is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// Outside any transaction
    Query,
    /// Inside the shared write transaction
    Transactional,
    /// `BEGIN`, `COMMIT` or `ROLLBACK`
    TransactionControl,
}

/// A statement about to be executed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementEvent {
    /// Unique event ID
    pub id: uuid::Uuid,
    pub kind: StatementKind,
    /// SQL text with positional placeholders
    pub text: String,
    /// Bound values, `values[i]` belongs to `$(i+1)`
    pub values: Vec<Value>,
    /// Event timestamp (UTC)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl StatementEvent {
    pub fn new(kind: StatementKind, text: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            kind,
            text: text.into(),
            values,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Number of positional parameters carried by the statement
    pub fn parameter_count(&self) -> usize {
        self.values.len()
    }
}
