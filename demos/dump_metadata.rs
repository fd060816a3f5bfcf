//! # Catalog dump
//!
//! Introspects the configured schemas and writes the catalog as a metadata
//! document. Point `engine.metadata_path` at the output to skip introspection
//! on later runs.
//!
//! ```text
//! cargo run --example dump_metadata -- catalog.json
//! ```

use anyhow::Context;
use nordic::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "nordic-metadata.json".to_string());

    let mut config = AppConfig::load().context("loading nordic.toml")?;
    // Always introspect, even if a document is configured
    config.engine.metadata_path = None;

    let nordic = Nordic::from_config(&config)?;
    let metadata = nordic.database_metadata().await?;

    for table in metadata.tables() {
        println!(
            "{:<40} {} columns, primary key: {}",
            table.qualified_name(),
            table.columns.len(),
            table
                .primary_keys()
                .iter()
                .map(|column| column.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    metadata
        .write_to_path(&output)
        .with_context(|| format!("writing {}", output))?;
    println!("Wrote {} tables to {}", metadata.table_count(), output);

    nordic.shutdown(false).await?;
    Ok(())
}
