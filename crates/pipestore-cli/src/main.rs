// Pipestore CLI
//
// Design Decision: Use clap derive for ergonomic argument parsing.
// Design Decision: Support text/json/yaml output formats for scripting.
// Design Decision: Connection settings come from PIPESTORE_DB_* and can be overridden per flag.
// Design Decision: The store is always disconnected before exit, even when a command fails.

mod commands;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pipestore::{DatabaseConfig, MongoStoreClient, StoreClient};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "pipestore")]
#[command(about = "Pipestore CLI - Inspect and restore pipeline items awaiting retry")]
#[command(version)]
pub struct Cli {
    /// Database host (overrides PIPESTORE_DB_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Database port (overrides PIPESTORE_DB_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database name (overrides PIPESTORE_DB_NAME)
    #[arg(long)]
    pub database: Option<String>,

    /// Per-call and connect timeout in milliseconds (overrides PIPESTORE_DB_TIMEOUT_MS)
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Output format
    #[arg(long, short, default_value = "text", value_parser = ["text", "json", "yaml"])]
    pub output: String,

    /// Suppress non-essential output
    #[arg(long, short)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that the database is reachable
    Ping,

    /// Manage stored items
    Items {
        #[command(subcommand)]
        command: commands::items::ItemsCommand,
    },

    /// Write every item of an application service as JSON
    Export {
        /// Application service key
        #[arg(long, short)]
        app_service_key: String,

        /// Destination file (stdout if omitted)
        #[arg(long, short)]
        file: Option<PathBuf>,
    },

    /// Store the items of a previous export, keeping their IDs
    Import {
        /// Export file to read
        file: PathBuf,
    },
}

impl Cli {
    fn database_config(&self) -> DatabaseConfig {
        let mut config = DatabaseConfig::from_env();
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(database) = &self.database {
            config.database_name = database.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config = config.with_timeout(Duration::from_millis(timeout_ms));
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so structured output on stdout stays parseable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "pipestore=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = cli.database_config();
    let output_format = output::OutputFormat::from_str(&cli.output);

    let client = MongoStoreClient::connect(&config)
        .await
        .with_context(|| format!("Failed to connect to {}:{}", config.host, config.port))?;

    let result = match cli.command {
        Commands::Ping => {
            if !cli.quiet {
                println!("Connected to {}:{}", config.host, config.port);
            }
            Ok(())
        }
        Commands::Items { command } => {
            commands::items::run(command, &client, output_format, cli.quiet).await
        }
        Commands::Export {
            app_service_key,
            file,
        } => {
            commands::transfer::run_export(
                &client,
                output_format,
                cli.quiet,
                &app_service_key,
                file.as_deref(),
            )
            .await
        }
        Commands::Import { file } => {
            commands::transfer::run_import(&client, output_format, cli.quiet, &file).await
        }
    };

    if let Err(e) = client.disconnect().await {
        warn!(error = %e, "failed to disconnect cleanly");
    } else {
        info!("disconnected");
    }

    result
}
