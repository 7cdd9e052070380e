use anyhow::Context;
use clap::Parser;
use config::Config;
use listener::Shutdown;
use server::Server;
use tracing_subscriber::EnvFilter;

mod config;
mod connection;
mod listener;
mod server;
mod session;
mod storage;
mod tracker;
mod winners;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_logger(&config.logging_level);
    tracing::debug!(?config, "loaded configuration");

    let shutdown = Shutdown::default();
    let server = Server::bind(&config, shutdown.clone())
        .with_context(|| format!("failed to listen on port {}", config.port))?;
    tracing::info!("server is listening on: {}", server.local_addr());

    tokio::spawn(async move {
        if let Err(err) = listener::wait_for_termination(shutdown).await {
            tracing::error!("failed to wait for a termination signal: {}", err);
        }
    });

    let report = server.run().await;
    tracing::info!(
        action = "shutdown",
        result = "success",
        completed_agencies = report.completed_agencies,
        winners = ?report.winners.as_ref().map(Vec::len),
    );

    Ok(())
}

// connect tracing to stdout
fn init_logger(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
