//! Connection and translator tests

use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use signal_system::{SignalManager, StatementKind};

use super::*;
use crate::errors::StoreError;
use crate::metadata::{ColumnMetadata, DatabaseMetadata, TableMetadata};
use crate::testing::{field, RecordingDriver};

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

fn connection() -> (Connection, RecordingDriver) {
    let driver = RecordingDriver::new();
    (Connection::new(Box::new(driver.clone())), driver)
}

fn catalog_with_tags() -> Arc<DatabaseMetadata> {
    Arc::new(DatabaseMetadata::new().with_table(TableMetadata::new(
        "public",
        "posts",
        vec![
            ColumnMetadata::new("id", "integer", 23).with_primary_key(),
            ColumnMetadata::new("tags", "ARRAY", 1009).with_alias("_text"),
        ],
    )))
}

// ========================================
// State machine
// ========================================

#[tokio::test]
async fn test_query_connects_lazily_once() {
    let (mut connection, driver) = connection();
    assert_eq!(connection.state(), ConnectionState::Disconnected);
    assert_eq!(driver.connect_count(), 0);

    connection.query(&Query::text("SELECT 1")).await.unwrap();
    connection.query(&Query::text("SELECT 2")).await.unwrap();

    assert_eq!(driver.connect_count(), 1);
    assert_eq!(connection.state(), ConnectionState::Idle);
    assert!(connection.is_connected());
    assert!(!connection.in_transaction());
    assert_eq!(driver.executed_sql(), vec!["SELECT 1", "SELECT 2"]);
}

#[tokio::test]
async fn test_transactional_statements_share_one_begin() {
    let (mut connection, driver) = connection();

    connection
        .query_with_transaction(&Query::text("INSERT 1"))
        .await
        .unwrap();
    connection
        .query_with_transaction(&Query::text("INSERT 2"))
        .await
        .unwrap();
    connection.query(&Query::text("SELECT 1")).await.unwrap();

    assert_eq!(connection.state(), ConnectionState::TransactionOpen);
    assert!(connection.in_transaction() && connection.is_connected());
    assert_eq!(
        driver.executed_sql(),
        vec!["BEGIN", "INSERT 1", "INSERT 2", "SELECT 1"]
    );

    connection.commit().await.unwrap();
    assert_eq!(connection.state(), ConnectionState::Idle);

    connection
        .query_with_transaction(&Query::text("INSERT 3"))
        .await
        .unwrap();
    assert_eq!(
        driver.executed_sql()[4..].to_vec(),
        vec!["COMMIT", "BEGIN", "INSERT 3"]
    );
}

#[tokio::test]
async fn test_commit_and_rollback_without_transaction_are_noops() {
    let (mut connection, driver) = connection();
    connection.commit().await.unwrap();
    connection.rollback().await.unwrap();
    connection.query(&Query::text("SELECT 1")).await.unwrap();
    connection.rollback().await.unwrap();

    assert_eq!(driver.executed_sql(), vec!["SELECT 1"]);
    assert_eq!(connection.state(), ConnectionState::Idle);
}

#[tokio::test]
async fn test_failed_commit_still_leaves_transaction() {
    let (mut connection, driver) = connection();
    driver.fail_transaction_statement(TransactionStatement::Commit);

    connection
        .query_with_transaction(&Query::text("UPDATE x"))
        .await
        .unwrap();
    let result = connection.commit().await;

    assert!(matches!(result, Err(StoreError::Execution(_))));
    assert_eq!(connection.state(), ConnectionState::Idle);
}

#[tokio::test]
async fn test_failed_statement_keeps_transaction_open() {
    let (mut connection, driver) = connection();
    driver.push_rows(Vec::new()).push_failure("duplicate key");

    connection
        .query_with_transaction(&Query::text("INSERT 1"))
        .await
        .unwrap();
    let result = connection
        .query_with_transaction(&Query::text("INSERT 2"))
        .await;

    assert!(result.is_err());
    assert!(connection.in_transaction());

    connection.rollback().await.unwrap();
    assert_eq!(
        driver.executed_sql(),
        vec!["BEGIN", "INSERT 1", "INSERT 2", "ROLLBACK"]
    );
}

#[tokio::test]
async fn test_close_resolves_transaction_and_is_idempotent() {
    let (mut connection, driver) = connection();
    connection
        .query_with_transaction(&Query::text("DELETE x"))
        .await
        .unwrap();

    connection.close(true).await.unwrap();
    connection.close(true).await.unwrap();

    assert_eq!(connection.state(), ConnectionState::Disconnected);
    assert_eq!(driver.executed_sql(), vec!["BEGIN", "DELETE x", "COMMIT"]);
    assert_eq!(driver.disconnect_count(), 1);
    assert!(!driver.is_connected());
}

#[tokio::test]
async fn test_close_without_commit_rolls_back() {
    let (mut connection, driver) = connection();
    connection
        .query_with_transaction(&Query::text("DELETE x"))
        .await
        .unwrap();
    connection.close(false).await.unwrap();
    assert_eq!(driver.executed_sql().last().unwrap(), "ROLLBACK");
}

#[tokio::test]
async fn test_close_releases_connection_when_rollback_fails() {
    let (mut connection, driver) = connection();
    driver.fail_transaction_statement(TransactionStatement::Rollback);
    connection
        .query_with_transaction(&Query::text("DELETE x"))
        .await
        .unwrap();

    let result = connection.close(false).await;

    assert!(result.is_err());
    assert_eq!(connection.state(), ConnectionState::Disconnected);
    assert_eq!(driver.disconnect_count(), 1);
}

#[tokio::test]
async fn test_close_on_never_connected_connection() {
    let (mut connection, driver) = connection();
    connection.close(true).await.unwrap();
    assert_eq!(driver.disconnect_count(), 0);
    assert!(driver.executed_sql().is_empty());
}

#[tokio::test]
async fn test_connect_failure_stays_disconnected() {
    let (mut connection, driver) = connection();
    driver.refuse_connect();
    assert!(connection.query(&Query::text("SELECT 1")).await.is_err());
    assert_eq!(connection.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_reconnects_after_close() {
    let (mut connection, driver) = connection();
    connection.query(&Query::text("SELECT 1")).await.unwrap();
    connection.close(false).await.unwrap();
    connection.query(&Query::text("SELECT 2")).await.unwrap();
    assert_eq!(driver.connect_count(), 2);
}

// ========================================
// Observation
// ========================================

#[tokio::test]
async fn test_statements_are_emitted_before_execution() {
    let signals = Arc::new(SignalManager::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        signals.add_callback(move |event| {
            seen.lock()
                .unwrap()
                .push((event.kind, event.text.clone(), event.values.len()));
        });
    }

    let driver = RecordingDriver::new();
    let mut connection = Connection::new(Box::new(driver)).with_signals(signals);
    connection.query(&Query::new("SELECT $1", vec![json!(1)])).await.unwrap();
    connection
        .query_with_transaction(&Query::new("DELETE $1", vec![json!(2)]))
        .await
        .unwrap();
    connection.commit().await.unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (StatementKind::Query, "SELECT $1".to_string(), 1),
            (StatementKind::TransactionControl, "BEGIN".to_string(), 0),
            (StatementKind::Transactional, "DELETE $1".to_string(), 1),
            (StatementKind::TransactionControl, "COMMIT".to_string(), 0),
        ]
    );
}

// ========================================
// Translation
// ========================================

#[tokio::test]
async fn test_array_columns_are_decoded_with_catalog() {
    let (mut connection, driver) = connection();
    connection.attach_metadata(catalog_with_tags());
    driver.push_result(RawResult::new(
        vec![
            row(json!({"id": 1, "tags": "{a,b,c}"})),
            row(json!({"id": 2, "tags": null})),
            row(json!({"id": 3, "tags": ""})),
            row(json!({"id": 4, "tags": "{}"})),
        ],
        vec![field("id", 23), field("tags", 1009)],
    ));

    let rows = connection.query(&Query::text("SELECT * FROM posts")).await.unwrap();

    assert_eq!(
        rows,
        vec![
            row(json!({"id": 1, "tags": ["a", "b", "c"]})),
            row(json!({"id": 2, "tags": null})),
            row(json!({"id": 3, "tags": ""})),
            row(json!({"id": 4, "tags": []})),
        ]
    );
}

#[tokio::test]
async fn test_no_translation_without_catalog() {
    let (mut connection, driver) = connection();
    driver.push_result(RawResult::new(
        vec![row(json!({"id": 1, "tags": "{a,b}"}))],
        vec![field("id", 23), field("tags", 1009)],
    ));

    let rows = connection.query(&Query::text("SELECT * FROM posts")).await.unwrap();
    assert_eq!(rows, vec![row(json!({"id": 1, "tags": "{a,b}"}))]);
}

#[test]
fn test_rows_without_array_fields_are_untouched() {
    let translator = ResultTranslator::with_metadata(catalog_with_tags());
    let rows = vec![
        row(json!({"id": 1, "label": "{not,an,array}"})),
        row(json!({"id": 2, "label": "plain"})),
    ];
    let translated = translator.translate(RawResult::new(
        rows.clone(),
        vec![field("id", 23), field("label", 25)],
    ));
    assert_eq!(translated, rows);
}

#[test]
fn test_already_decoded_and_malformed_values_are_kept() {
    let translator = ResultTranslator::with_metadata(catalog_with_tags());
    let translated = translator.translate(RawResult::new(
        vec![
            row(json!({"tags": ["x", "y"]})),
            row(json!({"tags": "not a literal"})),
            row(json!({"tags": "{\"a b\",NULL}"})),
        ],
        vec![field("tags", 1009)],
    ));
    assert_eq!(
        translated,
        vec![
            row(json!({"tags": ["x", "y"]})),
            row(json!({"tags": "not a literal"})),
            row(json!({"tags": ["a b", null]})),
        ]
    );
}

#[test]
fn test_detach_disables_translation() {
    let mut translator = ResultTranslator::with_metadata(catalog_with_tags());
    assert!(translator.has_metadata());
    translator.detach();
    assert!(!translator.has_metadata());
    let rows = translator.translate(RawResult::new(
        vec![row(json!({"tags": "{a}"}))],
        vec![field("tags", 1009)],
    ));
    assert_eq!(rows, vec![row(json!({"tags": "{a}"}))]);
}
