//! Hold'em table server
//!
//! Usage: cargo run -p holdem-web --bin holdem-server -- --port 8080

use clap::Parser;
use holdem_web::{load_with_sources, AppContext, LogFormat, ServerConfig, WebServer};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "holdem-server", version, about = "Single-table No-Limit Hold'em server")]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    /// Port to bind to
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
    /// SQLite file for finished hands; kept in memory when omitted
    #[arg(long)]
    database: Option<PathBuf>,
    /// TOML settings file, overrides `HOLDEM_CONFIG`
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    holdem_web::init_logging(LogFormat::from_env())?;

    let resolved = load_with_sources(args.config.as_deref())?;
    tracing::info!(
        stack = resolved.settings.starting_stack,
        small_blind = resolved.settings.small_blind,
        big_blind = resolved.settings.big_blind,
        sources = ?resolved.sources,
        "settings loaded"
    );

    let mut config = ServerConfig::new(args.host, args.port);
    if let Some(database) = args.database {
        config = config.with_database(database);
    }

    let context = AppContext::new(config, resolved.settings)?;
    let handle = WebServer::from_context(context).start().await?;
    println!("Server running at http://{}", handle.address());
    println!("Press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down");
    handle.shutdown().await?;
    Ok(())
}
