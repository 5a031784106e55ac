mod chat_cmd;
mod doctor_cmd;
mod runtime;
mod terminal_output;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use docquery_config::{config_file_path, load_and_prepare};
use docquery_gateway::{start_server, GatewayState};
use docquery_logging::init_logger;

use runtime::Runtime;

#[derive(Parser)]
#[command(name = "docquery")]
#[command(about = "DocQuery: ask questions about CSV, XLSX and PDF documents")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $DOCQUERY_CONFIG or ~/.docquery/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the web UI and session API
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Chat about one document in the terminal
    Chat {
        /// CSV, XLSX or PDF file to load
        #[arg(short, long)]
        file: PathBuf,
        /// Sampling temperature in [0.0, 1.0]
        #[arg(short, long)]
        temperature: Option<f32>,
    },
    /// Check config, credentials and PDF rendering support
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let path = cli.config.clone().unwrap_or_else(config_file_path);
    let config = load_and_prepare(&path)
        .await
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    init_logger(
        &config.logging.level,
        config.logging.dir.as_deref().map(std::path::Path::new),
    );

    let runtime = Runtime::build(config);

    match cli.command {
        Commands::Serve { port, bind } => run_server(runtime, port, bind).await?,
        Commands::Chat { file, temperature } => chat_cmd::run(&runtime, &file, temperature).await?,
        Commands::Doctor => doctor_cmd::run(&runtime).await?,
    }

    Ok(())
}

async fn run_server(runtime: Runtime, port: Option<u16>, bind: Option<String>) -> Result<()> {
    let server = &runtime.config.server;
    let bind = bind.unwrap_or_else(|| server.bind.clone());
    let port = port.unwrap_or(server.port);
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("Invalid bind address {bind}:{port}"))?;

    info!(
        addr = %addr,
        provider = %runtime.setup.provider,
        ready = runtime.setup.credential_present,
        "Starting DocQuery"
    );

    let max_upload_bytes = server.max_upload_bytes;
    let state = GatewayState::new(runtime.loader, runtime.executor, runtime.setup, max_upload_bytes);
    start_server(addr, state).await
}
