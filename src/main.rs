//! shift-handover - Shift Handover Checklist Service
//!
//! Serves the shift checklist API and the report-generation endpoint.
//!
//! # Usage
//!
//! ```bash
//! # Run the server with defaults (0.0.0.0:8080, ./data)
//! cargo run --release
//!
//! # Print the current shift, or the latest archived shifts
//! ./shift-handover status
//! ./shift-handover history --limit 5
//! ```
//!
//! # Environment Variables
//!
//! - `HANDOVER_CONFIG`: Path to a TOML config file (default: ./handover.toml)
//! - `GEMINI_API_KEY`: Upstream model credential (name set by `generator.api_key_env`)
//! - `HANDOVER_CORS_ORIGINS`: Comma-separated origins allowed by CORS
//! - `RUST_LOG`: Logging level (default: info)
//! - `RESET_DB`: Set to "true" to wipe all persistent data on startup

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use shift_handover::api::{self, ApiState};
use shift_handover::config::HandoverConfig;
use shift_handover::report::{GeminiClient, HttpReportRequester, TextGenerator};
use shift_handover::session::{ShiftService, ShiftSession};
use shift_handover::storage::{ShiftStore, SledShiftStore};

#[derive(Parser, Debug)]
#[command(name = "shift-handover", version, about = "Shift handover checklist service")]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:8080")
    #[arg(short, long, env = "HANDOVER_ADDR")]
    addr: Option<String>,

    /// Override the data directory holding the database (default: "./data")
    #[arg(long, env = "HANDOVER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Load configuration from this TOML file instead of the search order
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reset all persistent data (current shift and history) on startup.
    /// WARNING: This is destructive and cannot be undone!
    /// Can also be set via RESET_DB=true environment variable.
    #[arg(long)]
    reset_db: bool,

    #[command(subcommand)]
    command: Option<SubCommand>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Print the current shift, its phase and metrics as JSON
    Status,
    /// Print archived shifts as JSON, newest first
    History {
        /// Maximum number of entries
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

/// Check if database reset is requested via CLI flag or environment variable.
fn should_reset_db(cli_flag: bool) -> bool {
    if cli_flag {
        return true;
    }
    if let Ok(val) = std::env::var("RESET_DB") {
        let val_lower = val.to_lowercase();
        return val_lower == "true" || val_lower == "1" || val_lower == "yes";
    }
    false
}

fn load_config(args: &CliArgs) -> Result<HandoverConfig> {
    let mut config = match &args.config {
        Some(path) => HandoverConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => HandoverConfig::load(),
    };
    if let Some(addr) = &args.addr {
        config.server.addr = addr.clone();
    }
    if let Some(dir) = &args.data_dir {
        config.storage.data_dir = dir.clone();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn open_store(config: &HandoverConfig, reset: bool) -> Result<Arc<SledShiftStore>> {
    let path = config.storage.db_path();
    let store = SledShiftStore::open(&path)
        .with_context(|| format!("Failed to open database at {} (is another instance running?)", path.display()))?;

    if reset {
        warn!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        warn!("  RESET_DB DETECTED - WIPING ALL PERSISTENT DATA");
        warn!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        store.clear().context("Failed to reset database")?;
    }

    info!(path = %path.display(), size_bytes = store.size_bytes(), "Database opened");
    Ok(Arc::new(store))
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

fn print_status(store: Arc<SledShiftStore>) -> Result<()> {
    let session = ShiftSession::hydrate(store, today()).context("Failed to load current shift")?;
    let status = serde_json::json!({
        "phase": session.phase(),
        "shift": session.shift(),
        "metrics": session.metrics(),
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn print_history(store: &SledShiftStore, limit: usize) -> Result<()> {
    let entries = store.recent_history(limit).context("Failed to read shift history")?;
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

/// Upstream model for the report endpoint, if a credential is available.
fn build_generator(config: &HandoverConfig) -> Result<Option<Arc<dyn TextGenerator>>> {
    let settings = &config.generator;
    let Some(api_key) = settings.api_key() else {
        warn!(
            env = %settings.api_key_env,
            "No upstream credential set; /api/v1/report will answer CONFIG_ERROR"
        );
        return Ok(None);
    };

    let client = GeminiClient::new(&settings.base_url, &settings.model, &api_key, settings.timeout())
        .context("Failed to build upstream model client")?;
    info!(model = %client.model(), base_url = %settings.base_url, "Upstream model configured");
    Ok(Some(Arc::new(client)))
}

async fn serve(config: HandoverConfig, store: Arc<SledShiftStore>) -> Result<()> {
    let session = ShiftSession::hydrate(store, today()).context("Failed to load current shift")?;

    let endpoint = config.report.resolve_endpoint(&config.server.addr);
    let requester = HttpReportRequester::new(&endpoint, config.report.timeout(), config.report.prompt_style())
        .context("Failed to build report requester")?;
    info!(endpoint = %requester.endpoint(), "Report endpoint");

    let service = ShiftService::new(session, Arc::new(requester));
    let generator = build_generator(&config)?;
    let state = ApiState::new(service, generator, &config.generator.api_key_env);
    let app = api::create_app(state);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;
    info!(addr = %config.server.addr, "HTTP server listening");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await
        .context("HTTP server error")?;

    info!("[HttpServer] Graceful shutdown complete");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = load_config(&args)?;

    // Reset DB check happens inside open_store, before any shift is loaded
    let store = open_store(&config, should_reset_db(args.reset_db))?;

    match args.command {
        Some(SubCommand::Status) => print_status(store),
        Some(SubCommand::History { limit }) => print_history(&store, limit),
        None => {
            info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            info!("  Shift Handover - checklist and closure reporting");
            info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
            serve(config, store).await
        }
    }
}
