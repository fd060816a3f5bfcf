//! Connection and transaction management
//!
//! A [`Connection`] owns one [`DatabaseDriver`], connects lazily and tracks
//! whether a write transaction is open. Read statements run outside any
//! transaction; write statements share one transaction until it is
//! committed, rolled back or the connection is closed.

mod driver;
mod postgres;
mod translator;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use serde_json::Value;
use signal_system::{SignalManager, StatementEvent, StatementKind};
use type_mapping::Row;

use crate::errors::StoreResult;
use crate::metadata::DatabaseMetadata;
use crate::query_builder::Query;

pub use driver::{DatabaseDriver, RawResult, TransactionStatement};
pub use postgres::PgDriver;
pub use translator::ResultTranslator;

/// Connection shared by every Dao of one engine
pub type SharedConnection = Arc<tokio::sync::Mutex<Connection>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Idle,
    TransactionOpen,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        !matches!(self, ConnectionState::Disconnected)
    }

    pub fn in_transaction(&self) -> bool {
        matches!(self, ConnectionState::TransactionOpen)
    }
}

pub struct Connection {
    driver: Box<dyn DatabaseDriver>,
    state: ConnectionState,
    translator: ResultTranslator,
    signals: Arc<SignalManager>,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state)
            .field("translator", &self.translator)
            .finish()
    }
}

impl Connection {
    pub fn new(driver: Box<dyn DatabaseDriver>) -> Self {
        Self {
            driver,
            state: ConnectionState::Disconnected,
            translator: ResultTranslator::new(),
            signals: Arc::new(SignalManager::new()),
        }
    }

    pub fn with_signals(mut self, signals: Arc<SignalManager>) -> Self {
        self.signals = signals;
        self
    }

    pub fn into_shared(self) -> SharedConnection {
        Arc::new(tokio::sync::Mutex::new(self))
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn in_transaction(&self) -> bool {
        self.state.in_transaction()
    }

    pub fn signals(&self) -> &Arc<SignalManager> {
        &self.signals
    }

    /// Enable array decoding against `metadata`
    pub fn attach_metadata(&mut self, metadata: Arc<DatabaseMetadata>) {
        self.translator.attach(metadata);
    }

    pub fn detach_metadata(&mut self) {
        self.translator.detach();
    }

    pub fn translator(&self) -> &ResultTranslator {
        &self.translator
    }

    async fn connect_if_needed(&mut self) -> StoreResult<()> {
        if self.state == ConnectionState::Disconnected {
            tracing::debug!("[CONNECT] opening database connection");
            self.driver.connect().await?;
            self.state = ConnectionState::Idle;
        }
        Ok(())
    }

    async fn begin_if_needed(&mut self) -> StoreResult<()> {
        if self.state == ConnectionState::Idle {
            self.run_transaction_statement(TransactionStatement::Begin)
                .await?;
            self.state = ConnectionState::TransactionOpen;
        }
        Ok(())
    }

    async fn run_transaction_statement(&mut self, statement: TransactionStatement) -> StoreResult<()> {
        tracing::debug!("[{}]", statement.as_sql());
        self.signals.emit(StatementEvent::new(
            StatementKind::TransactionControl,
            statement.as_sql(),
            Vec::<Value>::new(),
        ));
        self.driver.execute_transaction_statement(statement).await
    }

    async fn execute(&mut self, query: &Query, kind: StatementKind) -> StoreResult<Vec<Row>> {
        tracing::debug!("[QUERY] SQL: {} | values: {:?}", query.text, query.values);
        self.signals.emit(StatementEvent::new(
            kind,
            query.text.clone(),
            query.values.clone(),
        ));
        let result = self.driver.execute(query).await?;
        Ok(self.translator.translate(result))
    }

    /// Run a statement outside any transaction
    pub async fn query(&mut self, query: &Query) -> StoreResult<Vec<Row>> {
        self.connect_if_needed().await?;
        self.execute(query, StatementKind::Query).await
    }

    /// Run a statement inside the shared write transaction, opening it first
    /// if needed. A failing statement leaves the transaction open.
    pub async fn query_with_transaction(&mut self, query: &Query) -> StoreResult<Vec<Row>> {
        self.connect_if_needed().await?;
        self.begin_if_needed().await?;
        self.execute(query, StatementKind::Transactional).await
    }

    pub async fn commit(&mut self) -> StoreResult<()> {
        self.finish_transaction(TransactionStatement::Commit).await
    }

    pub async fn rollback(&mut self) -> StoreResult<()> {
        self.finish_transaction(TransactionStatement::Rollback).await
    }

    async fn finish_transaction(&mut self, statement: TransactionStatement) -> StoreResult<()> {
        if !self.state.in_transaction() {
            tracing::debug!("[{}] no open transaction, nothing to do", statement.as_sql());
            return Ok(());
        }
        let result = self.run_transaction_statement(statement).await;
        self.state = ConnectionState::Idle;
        result
    }

    /// Resolve any open transaction and release the physical connection.
    ///
    /// The connection is released even when committing or rolling back
    /// fails; the first error is returned.
    pub async fn close(&mut self, should_commit: bool) -> StoreResult<()> {
        if self.state == ConnectionState::Disconnected {
            return Ok(());
        }

        let resolved = if should_commit {
            self.commit().await
        } else {
            self.rollback().await
        };

        tracing::debug!("[CLOSE] releasing database connection");
        let disconnected = self.driver.disconnect().await;
        self.state = ConnectionState::Disconnected;

        resolved.and(disconnected)
    }
}
