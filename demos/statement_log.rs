//! # Statement log
//!
//! Registers a statement callback, then runs a read, a write and a raw query
//! against the `users` table so every statement shows up with its values.

use nordic::prelude::*;
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let nordic = Nordic::from_config(&config)?;

    nordic.signals().add_callback(|event: &StatementEvent| {
        let age = chrono::Utc::now() - event.timestamp;
        println!(
            "[{:?}] {} {:?} ({} us ago)",
            event.kind,
            event.text,
            event.values,
            age.num_microseconds().unwrap_or_default()
        );
    });

    let users = nordic.get_dao("users").await?;
    println!("users: {}", users.count(Row::new()).await?);

    let created = users
        .create(row(json!({"first_name": "Ada", "last_name": "Lovelace"})))
        .await?;
    println!("created: {:?}", created);

    let rows = nordic
        .raw_query(
            "SELECT count(*)::int8 AS total FROM users WHERE first_name = :name",
            &row(json!({"name": "Ada"})),
        )
        .await?;
    println!("raw: {:?}", rows);

    // Leave the database as it was
    nordic.shutdown(false).await?;
    Ok(())
}
