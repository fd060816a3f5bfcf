//! PostgreSQL driver over a single sqlx connection

use std::time::Duration;

use async_trait::async_trait;
use config::DatabaseConfig;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection as _, Executor as _};
use type_mapping::{bind_json_value, describe_columns, row_to_json};

use super::driver::{DatabaseDriver, RawResult, TransactionStatement};
use crate::errors::{StoreError, StoreResult};
use crate::query_builder::Query;

pub struct PgDriver {
    options: PgConnectOptions,
    connect_timeout: Duration,
    connection: Option<PgConnection>,
}

impl std::fmt::Debug for PgDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgDriver")
            .field("connect_timeout", &self.connect_timeout)
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

impl PgDriver {
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.username)
            .password(&config.password);
        Self::from_options(options, Duration::from_secs(config.connect_timeout_seconds))
    }

    pub fn from_options(options: PgConnectOptions, connect_timeout: Duration) -> Self {
        Self {
            options,
            connect_timeout,
            connection: None,
        }
    }

    fn open_connection(&mut self) -> StoreResult<&mut PgConnection> {
        self.connection.as_mut().ok_or_else(|| {
            StoreError::Execution(sqlx::Error::Protocol(
                "statement issued on a closed connection".to_string(),
            ))
        })
    }
}

#[async_trait]
impl DatabaseDriver for PgDriver {
    async fn connect(&mut self) -> StoreResult<()> {
        if self.connection.is_some() {
            return Ok(());
        }
        let connecting = PgConnection::connect_with(&self.options);
        let connection = tokio::time::timeout(self.connect_timeout, connecting)
            .await
            .map_err(|_| {
                StoreError::Execution(sqlx::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("connect timed out after {:?}", self.connect_timeout),
                )))
            })??;
        self.connection = Some(connection);
        Ok(())
    }

    async fn disconnect(&mut self) -> StoreResult<()> {
        if let Some(connection) = self.connection.take() {
            connection.close().await?;
        }
        Ok(())
    }

    async fn execute(&mut self, query: &Query) -> StoreResult<RawResult> {
        let connection = self.open_connection()?;
        let mut statement = sqlx::query(&query.text);
        for value in &query.values {
            statement = bind_json_value(statement, value);
        }
        let rows = statement.fetch_all(&mut *connection).await?;
        let fields = rows.first().map(describe_columns).unwrap_or_default();
        Ok(RawResult::new(rows.iter().map(row_to_json).collect(), fields))
    }

    async fn execute_transaction_statement(
        &mut self,
        statement: TransactionStatement,
    ) -> StoreResult<()> {
        let connection = self.open_connection()?;
        (&mut *connection).execute(statement.as_sql()).await?;
        Ok(())
    }
}
