use std::path::PathBuf;

use clap::Parser;

/// Submits the bets placed at an agency to the lottery server
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Number identifying this agency
    #[arg(long, env = "CLI_ID")]
    pub id: u32,

    /// Address of the lottery server
    #[arg(long, env = "CLI_SERVER_ADDRESS", default_value = "server:12345")]
    pub server_address: String,

    /// Csv file with the bets placed at this agency
    #[arg(long, env = "CLI_BETS_FILE", value_name = "FILE")]
    pub bets_file: PathBuf,

    /// Log level, overridden by RUST_LOG when set
    #[arg(long, env = "CLI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}
