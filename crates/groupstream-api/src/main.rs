//! Groupstream server entry point.
//!
//! Binary name: `gstream`
//!
//! Parses CLI arguments, loads settings, wires the relay hub to the
//! configured completion provider, and serves the WebSocket endpoint.

mod http;
mod state;
mod transport;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use state::AppState;

#[derive(Parser)]
#[command(name = "gstream", about = "Group chat relay with streamed assistant replies", version)]
struct Cli {
    /// Path to the TOML settings file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the listen host from the settings file.
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port from the settings file.
    #[arg(long)]
    port: Option<u16>,

    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,groupstream=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let settings = groupstream_infra::config::load_settings(&cli.config).await?;
    let state = AppState::init(&settings)?;

    let host = cli.host.unwrap_or(settings.server.host);
    let port = cli.port.unwrap_or(settings.server.port);
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!(
        "  {} Groupstream listening on {}",
        console::style("⚡").bold(),
        console::style(format!("ws://{addr}/ws/chat")).cyan()
    );
    println!("  {}", console::style("Press Ctrl+C to stop").dim());

    let router = http::router::build_router(state);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\n  Server stopped.");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
