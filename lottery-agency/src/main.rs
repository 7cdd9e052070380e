use anyhow::Context;
use clap::Parser;
use config::Config;
use tokio::net::TcpStream;
use tracing_subscriber::EnvFilter;

mod bets;
mod client;
mod config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    init_logger(&config.log_level);
    tracing::debug!(?config, "loaded configuration");

    let bets = bets::load(&config.bets_file, config.id)
        .with_context(|| format!("failed to read bets from {}", config.bets_file.display()))?;

    let stream = match TcpStream::connect(&config.server_address).await {
        Ok(stream) => stream,
        Err(err) => {
            tracing::error!(action = "connect", result = "fail", client_id = config.id, error = %err);
            return Err(err.into());
        }
    };

    // dropping the submission closes the connection
    tokio::select! {
        result = client::submit(stream, &bets) => match result {
            Ok(()) => tracing::info!(
                action = "send_bets",
                result = "success",
                client_id = config.id,
                bets = bets.len(),
            ),
            Err(err) => {
                tracing::error!(action = "send_bets", result = "fail", client_id = config.id, error = %err);
                return Err(err.into());
            }
        },
        _ = termination() => {
            tracing::info!(action = "sigterm_received", result = "success", client_id = config.id);
        }
    }

    tracing::info!(action = "exit", result = "success", client_id = config.id);
    Ok(())
}

async fn termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    std::future::pending::<()>().await;
}

// connect tracing to stdout
fn init_logger(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
