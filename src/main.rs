//! Main entry point for the artforge tool server

use artforge::client::EverArtClient;
use artforge::pipeline::GenerationPipeline;
use artforge::retry::RetryPolicy;
use artforge::server::ToolServer;
use artforge::storage::StorageLayout;
use clap::Parser;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the required API credential.
const API_KEY_VAR: &str = "EVERART_API_KEY";

/// Image generation tool server
#[derive(Parser, Debug)]
#[command(name = "artforge", version, about)]
struct Cli {
    /// Directory for default image storage
    #[arg(long, default_value = "images")]
    storage_dir: PathBuf,

    /// Override the generation API endpoint
    #[arg(long)]
    base_url: Option<String>,

    /// Maximum attempts for remote calls (submission and download each)
    #[arg(long, default_value_t = 5)]
    max_retries: u32,

    /// Do not open stored images in the platform viewer
    #[arg(long)]
    no_open: bool,
}

/// Initialize tracing subscriber with optional JSON formatting.
///
/// Logs go to stderr; stdout carries the tool protocol.
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("artforge=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let api_key = match std::env::var(API_KEY_VAR) {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            error!("{API_KEY_VAR} is not set; refusing to start");
            std::process::exit(1);
        }
    };

    let client = match EverArtClient::new(api_key) {
        Ok(client) => client,
        Err(e) => {
            error!("failed to initialize generation client: {e}");
            std::process::exit(1);
        }
    };
    let client = match cli.base_url {
        Some(base_url) => client.with_base_url(base_url),
        None => client,
    };

    let retry = RetryPolicy::new(
        cli.max_retries,
        artforge::pipeline::config::INITIAL_BACKOFF,
        artforge::pipeline::config::BACKOFF_MULTIPLIER,
    );

    let storage = StorageLayout::new(cli.storage_dir);
    let pipeline = GenerationPipeline::new(client, storage.clone())
        .with_submit_policy(retry)
        .with_fetch_policy(retry)
        .with_viewer(!cli.no_open);

    let server = ToolServer::new(pipeline, storage);

    server
        .serve()
        .await
        .map_err(|e| anyhow::anyhow!("server terminated: {e}"))
}
