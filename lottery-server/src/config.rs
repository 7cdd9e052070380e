use std::path::PathBuf;

use clap::Parser;

/// Collects the bets of every agency, and announces the winners once all of them reported
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Port to listen on, on all interfaces
    #[arg(long, env = "SERVER_PORT", default_value_t = 12345)]
    pub port: u16,

    /// Size of the pending connections queue
    #[arg(long, env = "SERVER_LISTEN_BACKLOG", default_value_t = 5)]
    pub listen_backlog: u32,

    /// Log level, overridden by RUST_LOG when set
    #[arg(long, env = "LOGGING_LEVEL", default_value = "info")]
    pub logging_level: String,

    /// Csv file where the received bets are stored
    #[arg(long, env = "BETS_FILE", default_value = "bets.csv", value_name = "FILE")]
    pub bets_file: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Config;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["lottery-server"]).unwrap();
        assert_eq!(config.listen_backlog, 5);
        assert_eq!(config.bets_file.to_str(), Some("bets.csv"));
    }

    #[test]
    fn flags() {
        let config = Config::try_parse_from([
            "lottery-server",
            "--port",
            "3600",
            "--listen-backlog",
            "16",
            "--bets-file",
            "/tmp/bets.csv",
        ])
        .unwrap();

        assert_eq!(config.port, 3600);
        assert_eq!(config.listen_backlog, 16);
        assert_eq!(config.bets_file.to_str(), Some("/tmp/bets.csv"));
    }

    #[test]
    fn rejects_a_bad_port() {
        assert!(Config::try_parse_from(["lottery-server", "--port", "70000"]).is_err());
    }
}
