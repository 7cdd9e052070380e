use std::{net::SocketAddr, time::Duration};

use bet_protocol::Bet;

use crate::{
    config::Config,
    listener::{Listener, Shutdown},
    session::{Session, SessionState},
    storage::BetStorage,
    tracker::CompletionTracker,
    winners::WinnerResolver,
};

// number of agencies taking part in the lottery
pub const AGENCIES: usize = 5;

// pause before accepting again after a failed accept
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// What the server went through before stopping
#[derive(Debug, Default)]
pub struct Report {
    pub completed_agencies: usize,
    pub winners: Option<Vec<Bet>>,
}

/// Serves the agencies one at a time
///
/// a connection is fully handled before the next one is accepted, so an agency
/// holding its connection open blocks everyone else. there are no timeouts.
pub struct Server {
    listener: Listener,
    shutdown: Shutdown,
    storage: BetStorage,
    tracker: CompletionTracker,
    resolver: WinnerResolver,
}

impl Server {
    pub fn bind(config: &Config, shutdown: Shutdown) -> tokio::io::Result<Self> {
        let listener = Listener::bind(config.port, config.listen_backlog, &shutdown)?;
        let storage = BetStorage::new(&config.bets_file);

        Ok(Self::new(listener, shutdown, storage))
    }

    pub fn new(listener: Listener, shutdown: Shutdown, storage: BetStorage) -> Self {
        Self {
            listener,
            shutdown,
            resolver: WinnerResolver::new(storage.clone()),
            storage,
            tracker: CompletionTracker::new(AGENCIES),
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// accepts and handles connections until the shutdown is triggered
    pub async fn run(mut self) -> Report {
        let mut report = Report::default();

        while self.shutdown.is_active() && !self.listener.is_closed() {
            tracing::info!(action = "accept_connections", result = "in_progress");
            let (stream, addr) = match self.listener.accept().await {
                Ok(Some(accepted)) => accepted,
                // the listener was closed by the shutdown
                Ok(None) => break,
                Err(err) => {
                    tracing::error!(action = "accept_connections", result = "fail", error = %err);
                    // errors such as running out of file descriptors tend to repeat
                    tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    continue;
                }
            };
            tracing::info!(action = "accept_connections", result = "success", ip = %addr.ip());

            let state = Session::new(stream, addr).handle(&self.storage).await;
            if state != SessionState::Success {
                continue;
            }

            if self.tracker.note_completion() {
                tracing::info!(
                    action = "all_agencies_completed",
                    result = "success",
                    agencies = self.tracker.count(),
                );

                match self.resolver.find_winners() {
                    Ok(winners) => report.winners = Some(winners),
                    Err(err) => {
                        tracing::error!(action = "get_winners", result = "fail", error = %err)
                    }
                }
            }
        }

        report.completed_agencies = self.tracker.count();
        report
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpStream,
        task::JoinHandle,
    };

    use super::{Report, Server, AGENCIES};
    use crate::{
        listener::{Listener, Shutdown},
        storage::{BetStorage, LOTTERY_WINNER_NUMBER},
    };

    struct Running {
        port: u16,
        shutdown: Shutdown,
        handle: JoinHandle<Report>,
        _dir: tempfile::TempDir,
    }

    impl Running {
        async fn stop(self) -> Report {
            self.shutdown.trigger();
            tokio::time::timeout(Duration::from_secs(5), self.handle)
                .await
                .expect("the server should stop on shutdown")
                .unwrap()
        }
    }

    fn start() -> Running {
        let dir = tempfile::tempdir().unwrap();
        let shutdown = Shutdown::default();
        let listener = Listener::bind(0, 5, &shutdown).unwrap();
        let storage = BetStorage::new(dir.path().join("bets.csv"));

        let server = Server::new(listener, shutdown.clone(), storage);
        let port = server.local_addr().port();

        Running {
            port,
            shutdown,
            handle: tokio::spawn(server.run()),
            _dir: dir,
        }
    }

    fn batch(agency: u32) -> String {
        format!(
            "{agency},Ana,Perez,1,2000-01-01,{}\t{agency},Juan,Diaz,2,2000-01-02,{}\n",
            LOTTERY_WINNER_NUMBER,
            agency,
        )
    }

    // sends a whole batch, and returns whatever the server answered
    async fn submit(port: u16, batch: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        stream.write_all(batch.as_bytes()).await.unwrap();

        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.unwrap();
        reply
    }

    #[tokio::test]
    async fn no_winners_before_every_agency_reported() {
        let server = start();

        for agency in 1..AGENCIES as u32 {
            assert_eq!(submit(server.port, &batch(agency)).await, "ALL_BETS_ACK\n");
        }

        let report = server.stop().await;
        assert_eq!(report.completed_agencies, AGENCIES - 1);
        assert!(report.winners.is_none());
    }

    #[tokio::test]
    async fn winners_are_resolved_once_the_last_agency_reports() {
        let server = start();

        for agency in 1..=AGENCIES as u32 {
            assert_eq!(submit(server.port, &batch(agency)).await, "ALL_BETS_ACK\n");
        }

        let report = server.stop().await;
        assert_eq!(report.completed_agencies, AGENCIES);

        let winners = report.winners.expect("winners should have been resolved");
        assert_eq!(winners.len(), AGENCIES);
        assert!(winners.iter().all(|bet| bet.first_name == "Ana"));
        let agencies: Vec<_> = winners.iter().map(|bet| bet.agency).collect();
        assert_eq!(agencies, [1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn dropped_connections_do_not_count() {
        let server = start();

        // disconnects in the middle of its batch
        let mut stream = TcpStream::connect(("127.0.0.1", server.port)).await.unwrap();
        stream.write_all(b"1,Ana,Perez,1,2000-01-01,75").await.unwrap();
        drop(stream);

        // a batch that can't be parsed
        assert_eq!(submit(server.port, "definitely not a bet\n").await, "");

        for agency in 1..AGENCIES as u32 {
            assert_eq!(submit(server.port, &batch(agency)).await, "ALL_BETS_ACK\n");
        }

        // the server keeps serving, and the threshold is still one agency away
        let report = server.stop().await;
        assert_eq!(report.completed_agencies, AGENCIES - 1);
        assert!(report.winners.is_none());
    }

    #[tokio::test]
    async fn extra_agencies_do_not_resolve_again() {
        let server = start();

        for agency in 1..=AGENCIES as u32 + 1 {
            assert_eq!(submit(server.port, &batch(agency)).await, "ALL_BETS_ACK\n");
        }

        let report = server.stop().await;
        assert_eq!(report.completed_agencies, AGENCIES);
        // resolved with the bets of the first five agencies only
        assert_eq!(report.winners.unwrap().len(), AGENCIES);
    }

    #[tokio::test]
    async fn shutdown_lets_the_current_session_finish() {
        let server = start();
        let port = server.port;

        let mut stream = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let full = batch(1);
        let (head, tail) = full.split_at(10);
        stream.write_all(head.as_bytes()).await.unwrap();

        // let the server accept the connection and wait for the rest of the batch
        tokio::time::sleep(Duration::from_millis(100)).await;
        server.shutdown.trigger();

        stream.write_all(tail.as_bytes()).await.unwrap();
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await.unwrap();
        assert_eq!(reply, "ALL_BETS_ACK\n");

        let report = server.stop().await;
        assert_eq!(report.completed_agencies, 1);
        assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());
    }

    #[tokio::test]
    async fn shutdown_stops_accepting() {
        let server = start();
        let port = server.port;

        let report = server.stop().await;
        assert_eq!(report.completed_agencies, 0);
        assert!(TcpStream::connect(("127.0.0.1", port)).await.is_err());
    }
}
