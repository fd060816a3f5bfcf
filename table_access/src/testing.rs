//! In-memory driver for tests
//!
//! [`RecordingDriver`] records every statement it receives and answers from
//! scripted results. Clones share state, so a test can keep one clone while
//! the connection owns another.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use type_mapping::{FieldDescription, Row};

use crate::connection::{DatabaseDriver, RawResult, TransactionStatement};
use crate::errors::{StoreError, StoreResult};
use crate::metadata::{ColumnRow, DatabaseMetadata, TableRow};
use crate::query_builder::Query;

/// A statement as the driver received it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStatement {
    pub text: String,
    pub values: Vec<Value>,
}

#[derive(Debug)]
enum Scripted {
    Result(RawResult),
    Failure(String),
}

#[derive(Debug, Default)]
struct Recording {
    statements: Vec<RecordedStatement>,
    queued: VecDeque<Scripted>,
    rules: Vec<(String, RawResult)>,
    failing_transaction_statements: Vec<TransactionStatement>,
    refuse_connect: bool,
    connected: bool,
    connects: usize,
    disconnects: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingDriver {
    inner: Arc<Mutex<Recording>>,
}

fn failure(message: impl Into<String>) -> StoreError {
    StoreError::Execution(sqlx::Error::Protocol(message.into()))
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Answer the next unmatched statement with `result`
    pub fn push_result(&self, result: RawResult) -> &Self {
        self.lock().queued.push_back(Scripted::Result(result));
        self
    }

    /// Answer the next unmatched statement with `rows` and no field types
    pub fn push_rows(&self, rows: Vec<Row>) -> &Self {
        self.push_result(RawResult::new(rows, Vec::new()))
    }

    /// Fail the next unmatched statement
    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        self.lock().queued.push_back(Scripted::Failure(message.into()));
        self
    }

    /// Answer every statement containing `fragment` with `result`
    pub fn respond_when(&self, fragment: impl Into<String>, result: RawResult) -> &Self {
        self.lock().rules.push((fragment.into(), result));
        self
    }

    pub fn fail_transaction_statement(&self, statement: TransactionStatement) -> &Self {
        self.lock().failing_transaction_statements.push(statement);
        self
    }

    pub fn refuse_connect(&self) -> &Self {
        self.lock().refuse_connect = true;
        self
    }

    /// Answer the introspection queries with the tables of `metadata`
    pub fn serve_catalog(&self, metadata: &DatabaseMetadata) -> &Self {
        let mut tables = Vec::new();
        let mut columns = Vec::new();
        for table in metadata.tables() {
            tables.push(to_row(&TableRow::new(&table.schema, &table.name)));
            for column in &table.columns {
                columns.push(to_row(&ColumnRow {
                    table_schema: table.schema.clone(),
                    table_name: table.name.clone(),
                    column_name: column.name.clone(),
                    is_nullable: if column.required { "NO" } else { "YES" }.to_string(),
                    data_type: column.data_type.clone(),
                    is_primary: column.primary_key,
                    data_type_id: column.data_type_id,
                    data_type_alias: column.data_type_alias.clone(),
                }));
            }
        }
        self.respond_when(
            "FROM information_schema.tables",
            RawResult::new(tables, Vec::new()),
        );
        self.respond_when(
            "FROM information_schema.columns",
            RawResult::new(columns, Vec::new()),
        );
        self
    }

    pub fn statements(&self) -> Vec<RecordedStatement> {
        self.lock().statements.clone()
    }

    /// Text of every statement received, transaction control included
    pub fn executed_sql(&self) -> Vec<String> {
        self.lock()
            .statements
            .iter()
            .map(|s| s.text.clone())
            .collect()
    }

    pub fn last_statement(&self) -> Option<RecordedStatement> {
        self.lock().statements.last().cloned()
    }

    pub fn connect_count(&self) -> usize {
        self.lock().connects
    }

    pub fn disconnect_count(&self) -> usize {
        self.lock().disconnects
    }

    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }
}

fn to_row<T: serde::Serialize>(value: &T) -> Row {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => Row::new(),
    }
}

#[async_trait]
impl DatabaseDriver for RecordingDriver {
    async fn connect(&mut self) -> StoreResult<()> {
        let mut recording = self.lock();
        if recording.refuse_connect {
            return Err(failure("connection refused"));
        }
        recording.connected = true;
        recording.connects += 1;
        Ok(())
    }

    async fn disconnect(&mut self) -> StoreResult<()> {
        let mut recording = self.lock();
        recording.connected = false;
        recording.disconnects += 1;
        Ok(())
    }

    async fn execute(&mut self, query: &Query) -> StoreResult<RawResult> {
        let mut recording = self.lock();
        if !recording.connected {
            return Err(failure("statement issued on a closed connection"));
        }
        recording.statements.push(RecordedStatement {
            text: query.text.clone(),
            values: query.values.clone(),
        });

        if let Some((_, result)) = recording
            .rules
            .iter()
            .find(|(fragment, _)| query.text.contains(fragment.as_str()))
        {
            return Ok(result.clone());
        }

        match recording.queued.pop_front() {
            Some(Scripted::Result(result)) => Ok(result),
            Some(Scripted::Failure(message)) => Err(failure(message)),
            None => Ok(RawResult::default()),
        }
    }

    async fn execute_transaction_statement(
        &mut self,
        statement: TransactionStatement,
    ) -> StoreResult<()> {
        let mut recording = self.lock();
        if !recording.connected {
            return Err(failure("statement issued on a closed connection"));
        }
        recording.statements.push(RecordedStatement {
            text: statement.as_sql().to_string(),
            values: Vec::new(),
        });
        if recording.failing_transaction_statements.contains(&statement) {
            return Err(failure(format!("{} failed", statement.as_sql())));
        }
        Ok(())
    }
}

/// Field description helper for scripted results
pub fn field(name: &str, type_id: u32) -> FieldDescription {
    FieldDescription::new(name, type_id)
}
