// Export and import of stored items

use crate::output::{print_field, OutputFormat};
use anyhow::{Context, Result};
use pipestore::{StoreClient, StoredObject};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// On-disk snapshot of one application service's items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFile {
    pub app_service_key: String,
    #[serde(default)]
    pub items: Vec<StoredObject>,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: usize,
}

/// Read every item stored for `app_service_key`
pub async fn export_items(client: &dyn StoreClient, app_service_key: &str) -> Result<ExportFile> {
    let items = client
        .retrieve_from_store(app_service_key)
        .await
        .with_context(|| format!("Failed to read items for '{}'", app_service_key))?;

    Ok(ExportFile {
        app_service_key: app_service_key.to_string(),
        items,
    })
}

/// Store every item of `file`, keeping their identifiers
///
/// A failing item is logged and counted, the rest are still imported.
pub async fn import_items(client: &dyn StoreClient, file: ExportFile) -> ImportSummary {
    let mut summary = ImportSummary::default();

    for item in file.items {
        let id = item.id.clone();
        match client.store(item).await {
            Ok(_) => summary.imported += 1,
            Err(e) => {
                warn!(id = %id, error = %e, "failed to import item");
                summary.failed += 1;
            }
        }
    }

    summary
}

pub async fn run_export(
    client: &dyn StoreClient,
    output: OutputFormat,
    quiet: bool,
    app_service_key: &str,
    file: Option<&Path>,
) -> Result<()> {
    let export = export_items(client, app_service_key).await?;
    let json = serde_json::to_string_pretty(&export)?;

    match file {
        Some(path) => {
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if output.is_text() {
                if !quiet {
                    println!("Exported {} items to {}", export.items.len(), path.display());
                }
            } else {
                output.print_value(&serde_json::json!({
                    "appServiceKey": export.app_service_key,
                    "exported": export.items.len(),
                    "file": path.display().to_string(),
                }))?;
            }
        }
        None => println!("{}", json),
    }

    Ok(())
}

pub async fn run_import(
    client: &dyn StoreClient,
    output: OutputFormat,
    quiet: bool,
    file: &Path,
) -> Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let export: ExportFile = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", file.display()))?;

    let summary = import_items(client, export).await;

    if output.is_text() {
        if !quiet {
            print_field("Imported", &summary.imported.to_string());
            print_field("Failed", &summary.failed.to_string());
        }
    } else {
        output.print_value(&summary)?;
    }

    if summary.failed > 0 {
        anyhow::bail!("{} items could not be imported", summary.failed);
    }

    Ok(())
}
