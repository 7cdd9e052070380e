use std::net::SocketAddr;

use bet_protocol::ALL_BETS_ACK;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};

use crate::{
    connection::{ClientConnection, ConnectionErr},
    storage::{BetStorage, StorageErr},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Pending,
    Success,
    Failed,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionErr {
    #[error("{0}")]
    Connection(#[from] ConnectionErr),

    #[error("{0}")]
    Storage(#[from] StorageErr),

    #[error("The acknowledgment couldn't be delivered")]
    AckNotDelivered,
}

/// A single agency's submission: one batch in, one acknowledgment out
pub struct Session<S = TcpStream> {
    connection: ClientConnection<S>,
    state: SessionState,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, client_addr: SocketAddr) -> Self {
        Self {
            connection: ClientConnection::new(stream, client_addr),
            state: SessionState::Pending,
        }
    }

    /// runs the exchange to completion, and closes the connection
    ///
    /// failures are logged and reported through the returned state,
    /// the agency only ever sees an acknowledgment or a closed connection.
    pub async fn handle(mut self, storage: &BetStorage) -> SessionState {
        let ip = self.connection.client_addr.ip();

        self.state = match self.exchange(storage).await {
            Ok(()) => SessionState::Success,
            Err(SessionErr::AckNotDelivered) => {
                tracing::warn!(action = "send_all_bets_ack", result = "fail", %ip);
                SessionState::Failed
            }
            Err(SessionErr::Storage(err)) => {
                tracing::error!(action = "store_bets", result = "fail", %ip, error = %err);
                SessionState::Failed
            }
            Err(err) => {
                tracing::error!(action = "receive_message", result = "fail", %ip, error = %err);
                SessionState::Failed
            }
        };

        let state = self.state;
        self.connection.close().await;
        state
    }

    async fn exchange(&mut self, storage: &BetStorage) -> Result<(), SessionErr> {
        let ip = self.connection.client_addr.ip();

        let bets = self.connection.receive_messages().await?;
        tracing::info!(
            action = "receive_all_bets",
            result = "success",
            %ip,
            bets = bets.len(),
        );

        // only acknowledge what has been stored
        storage.store_bets(&bets)?;

        if !self.connection.send_message(ALL_BETS_ACK).await {
            return Err(SessionErr::AckNotDelivered);
        }
        tracing::info!(action = "send_all_bets_ack", result = "success", %ip);

        Ok(())
    }
}
