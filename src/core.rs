//! Core Nordic functionality
//!
//! [`Nordic`] owns the one database connection and the lazily built catalog,
//! and hands out table-bound [`Dao`] values that share both.

use std::collections::HashMap;
use std::sync::Arc;

use config::AppConfig;
use signal_system::SignalManager;
use table_access::{
    CatalogIntrospector, ColumnExpression, ColumnExpressions, Connection, Dao, DataCodec,
    DatabaseDriver, DatabaseMetadata, EntityContext, ManagedTimestamp, MetadataSource, PgDriver,
    Row, SharedConnection,
};

use crate::entity::{Entity, EntityIdentifier};
use crate::errors::NordicResult;
use crate::raw_query::compile_named_query;

/// Engine instance: one connection, one catalog, any number of DAOs
pub struct Nordic {
    connection: SharedConnection,
    catalog: tokio::sync::Mutex<Option<Arc<DatabaseMetadata>>>,
    metadata_source: MetadataSource,
    codec: DataCodec,
    expressions: HashMap<EntityContext, ColumnExpressions>,
    signals: Arc<SignalManager>,
}

impl std::fmt::Debug for Nordic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Nordic")
            .field("metadata_source", &self.metadata_source)
            .field("codec", &self.codec)
            .field("expressions", &self.expressions.len())
            .finish()
    }
}

pub struct NordicBuilder {
    driver: Box<dyn DatabaseDriver>,
    metadata_source: MetadataSource,
    codec: DataCodec,
    expressions: HashMap<EntityContext, ColumnExpressions>,
    signals: Option<Arc<SignalManager>>,
}

impl NordicBuilder {
    pub fn metadata_source(mut self, source: MetadataSource) -> Self {
        self.metadata_source = source;
        self
    }

    /// Introspect `schemas` instead of only `public`
    pub fn schemas(self, schemas: Vec<String>) -> Self {
        self.metadata_source(MetadataSource::Introspect { schemas })
    }

    /// Skip introspection and use `metadata` as the catalog
    pub fn metadata_document(self, metadata: DatabaseMetadata) -> Self {
        self.metadata_source(MetadataSource::Document(metadata))
    }

    pub fn codec(mut self, codec: DataCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Register a column expression for one table
    pub fn column_expression<E>(
        mut self,
        table: EntityContext,
        column: impl Into<String>,
        expression: E,
    ) -> Self
    where
        E: ColumnExpression + 'static,
    {
        self.expressions
            .entry(table)
            .or_default()
            .register(column, expression);
        self
    }

    pub fn signals(mut self, signals: Arc<SignalManager>) -> Self {
        self.signals = Some(signals);
        self
    }

    pub fn build(self) -> Nordic {
        let signals = self
            .signals
            .unwrap_or_else(|| Arc::new(SignalManager::new()));
        let connection = Connection::new(self.driver)
            .with_signals(Arc::clone(&signals))
            .into_shared();

        Nordic {
            connection,
            catalog: tokio::sync::Mutex::new(None),
            metadata_source: self.metadata_source,
            codec: self.codec,
            expressions: self.expressions,
            signals,
        }
    }
}

impl Nordic {
    pub fn builder(driver: impl DatabaseDriver + 'static) -> NordicBuilder {
        NordicBuilder {
            driver: Box::new(driver),
            metadata_source: MetadataSource::default(),
            codec: DataCodec::identity(),
            expressions: HashMap::new(),
            signals: None,
        }
    }

    /// Wire a PostgreSQL-backed engine from configuration.
    ///
    /// Nothing connects here; the first statement opens the connection.
    pub fn from_config(config: &AppConfig) -> NordicResult<Self> {
        config.validate()?;

        let engine = &config.engine;
        let metadata_source = match &engine.metadata_path {
            Some(path) => MetadataSource::Document(DatabaseMetadata::from_path(path)?),
            None => MetadataSource::Introspect {
                schemas: engine.schemas.clone(),
            },
        };

        let mut builder = Nordic::builder(PgDriver::new(&config.database))
            .metadata_source(metadata_source)
            .codec(DataCodec::from_key_cases(engine.object_keys, engine.row_keys));

        for managed in &engine.managed_timestamps {
            let (schema, table) = managed.schema_and_table();
            builder = builder.column_expression(
                EntityContext::new(schema, table),
                managed.column.clone(),
                ManagedTimestamp::new(managed.policy),
            );
        }

        crate::debug_log!(
            "[CONFIG] engine for {}:{}/{} with {} managed columns",
            config.database.host,
            config.database.port,
            config.database.database,
            engine.managed_timestamps.len()
        );

        Ok(builder.build())
    }

    pub fn signals(&self) -> &Arc<SignalManager> {
        &self.signals
    }

    pub fn codec(&self) -> &DataCodec {
        &self.codec
    }

    /// The catalog, built on first use.
    ///
    /// Concurrent first callers wait for a single build.
    pub async fn database_metadata(&self) -> NordicResult<Arc<DatabaseMetadata>> {
        let mut slot = self.catalog.lock().await;
        if let Some(metadata) = slot.as_ref() {
            return Ok(Arc::clone(metadata));
        }

        let metadata = self.build_catalog().await?;
        *slot = Some(Arc::clone(&metadata));
        Ok(metadata)
    }

    /// Discard the cached catalog and build it again from its source
    pub async fn refresh_metadata(&self) -> NordicResult<Arc<DatabaseMetadata>> {
        let mut slot = self.catalog.lock().await;
        *slot = None;
        self.connection.lock().await.detach_metadata();

        let metadata = self.build_catalog().await?;
        *slot = Some(Arc::clone(&metadata));
        Ok(metadata)
    }

    // Callers hold the catalog lock.
    async fn build_catalog(&self) -> NordicResult<Arc<DatabaseMetadata>> {
        let mut connection = self.connection.lock().await;

        let metadata = match &self.metadata_source {
            MetadataSource::Introspect { schemas } => {
                tracing::debug!("[CATALOG] introspecting schemas {:?}", schemas);
                CatalogIntrospector::new(&mut *connection)
                    .build(schemas)
                    .await?
            }
            MetadataSource::Document(document) => {
                tracing::debug!(
                    "[CATALOG] using metadata document with {} tables",
                    document.table_count()
                );
                document.clone()
            }
        };

        let metadata = Arc::new(metadata);
        connection.attach_metadata(Arc::clone(&metadata));
        tracing::debug!("[CATALOG] ready with {} tables", metadata.table_count());
        Ok(metadata)
    }

    /// Bind a [`Dao`] to the table `entity` names
    pub async fn get_dao(&self, entity: impl Into<EntityIdentifier>) -> NordicResult<Dao> {
        let context = entity.into().resolve()?;
        let metadata = self.database_metadata().await?;
        let table = metadata.table_for(&context)?.clone();

        let mut dao = Dao::new(
            Arc::new(table),
            Arc::clone(&self.connection),
            self.codec.clone(),
        );
        if let Some(expressions) = self.expressions.get(&context) {
            dao = dao.with_expressions(expressions.clone());
        }

        crate::debug_log!("[DAO] bound {}", context);
        Ok(dao)
    }

    pub async fn get_dao_for<E: Entity>(&self) -> NordicResult<Dao> {
        self.get_dao(EntityIdentifier::of::<E>()).await
    }

    /// Run SQL with `:name` placeholders outside any transaction.
    ///
    /// Strings bind as `text`; compare them with `uuid` or timestamp columns
    /// through an explicit cast such as `:id::uuid`. Rows come back in the
    /// object key convention.
    pub async fn raw_query(&self, sql: &str, params: &Row) -> NordicResult<Vec<Row>> {
        let query = compile_named_query(sql, params);
        crate::trace_log!("[RAW] {} with {} values", query.text, query.values.len());

        let rows = self.connection.lock().await.query(&query).await?;
        Ok(rows
            .into_iter()
            .map(|row| self.codec.object_from_row(row))
            .collect())
    }

    pub async fn commit(&self) -> NordicResult<()> {
        self.connection.lock().await.commit().await?;
        Ok(())
    }

    pub async fn rollback(&self) -> NordicResult<()> {
        self.connection.lock().await.rollback().await?;
        Ok(())
    }

    pub async fn in_transaction(&self) -> bool {
        self.connection.lock().await.in_transaction()
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_connected()
    }

    /// Resolve any open transaction, close the connection and drop the catalog.
    ///
    /// The engine stays usable: the next call reconnects and rebuilds.
    pub async fn shutdown(&self, should_commit: bool) -> NordicResult<()> {
        let mut slot = self.catalog.lock().await;
        let mut connection = self.connection.lock().await;

        let closed = connection.close(should_commit).await;
        connection.detach_metadata();
        *slot = None;

        tracing::debug!("[CLOSE] engine shut down (commit: {})", should_commit);
        closed?;
        Ok(())
    }
}
