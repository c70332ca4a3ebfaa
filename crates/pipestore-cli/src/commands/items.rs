// Stored item commands

use crate::output::{print_field, print_table_header, print_table_row, OutputFormat};
use anyhow::{Context, Result};
use clap::Subcommand;
use pipestore::{StoreClient, StoredObject};
use serde::Serialize;

#[derive(Subcommand)]
pub enum ItemsCommand {
    /// List items stored for an application service
    List {
        /// Application service key
        #[arg(long, short)]
        app_service_key: String,
    },

    /// Set the retry count of a stored item
    RetryCount {
        /// Composite item ID
        id: String,

        /// New retry count
        count: u32,
    },

    /// Remove a stored item
    Remove {
        /// Composite item ID
        id: String,
    },
}

/// Summary row used for structured listing output
#[derive(Debug, Serialize)]
struct ItemSummary<'a> {
    id: &'a str,
    retry_count: u32,
    pipeline_position: i32,
    payload_bytes: usize,
    correlation_id: &'a str,
}

impl<'a> From<&'a StoredObject> for ItemSummary<'a> {
    fn from(object: &'a StoredObject) -> Self {
        Self {
            id: &object.id,
            retry_count: object.retry_count,
            pipeline_position: object.pipeline_position,
            payload_bytes: object.payload.len(),
            correlation_id: &object.correlation_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct Affected<'a> {
    id: &'a str,
    matched: u64,
}

pub async fn run(
    command: ItemsCommand,
    client: &dyn StoreClient,
    output: OutputFormat,
    quiet: bool,
) -> Result<()> {
    match command {
        ItemsCommand::List { app_service_key } => list(client, output, &app_service_key).await,
        ItemsCommand::RetryCount { id, count } => {
            retry_count(client, output, quiet, &id, count).await
        }
        ItemsCommand::Remove { id } => remove(client, output, quiet, &id).await,
    }
}

async fn list(
    client: &dyn StoreClient,
    output: OutputFormat,
    app_service_key: &str,
) -> Result<()> {
    let items = client
        .retrieve_from_store(app_service_key)
        .await
        .with_context(|| format!("Failed to list items for '{}'", app_service_key))?;

    if output.is_text() {
        if items.is_empty() {
            println!("No items stored for '{}'.", app_service_key);
            return Ok(());
        }

        print_table_header(&[
            ("ID", 61),
            ("RETRIES", 7),
            ("POSITION", 8),
            ("BYTES", 8),
        ]);
        for item in &items {
            print_table_row(&[
                (&item.id, 61),
                (&item.retry_count.to_string(), 7),
                (&item.pipeline_position.to_string(), 8),
                (&item.payload.len().to_string(), 8),
            ]);
        }
    } else {
        let summaries: Vec<ItemSummary<'_>> = items.iter().map(ItemSummary::from).collect();
        output.print_value(&summaries)?;
    }

    Ok(())
}

async fn retry_count(
    client: &dyn StoreClient,
    output: OutputFormat,
    quiet: bool,
    id: &str,
    count: u32,
) -> Result<()> {
    let matched = client
        .update_retry_count(id, count)
        .await
        .with_context(|| format!("Failed to update retry count of '{}'", id))?;

    if output.is_text() {
        if matched == 0 {
            eprintln!("No item matched '{}'", id);
        } else if !quiet {
            println!("Updated retry count: {}", id);
            print_field("Retry count", &count.to_string());
        }
    } else {
        output.print_value(&Affected { id, matched })?;
    }

    Ok(())
}

async fn remove(
    client: &dyn StoreClient,
    output: OutputFormat,
    quiet: bool,
    id: &str,
) -> Result<()> {
    let matched = client
        .remove_from_store(id)
        .await
        .with_context(|| format!("Failed to remove '{}'", id))?;

    if output.is_text() {
        if matched == 0 {
            eprintln!("No item matched '{}'", id);
        } else if !quiet {
            println!("Removed item: {}", id);
        }
    } else {
        output.print_value(&Affected { id, matched })?;
    }

    Ok(())
}
