use std::net::SocketAddr;

use bet_protocol::{Bet, BetParseErr, BATCH_TERMINATOR, MAX_BATCH_LEN};
use bytes::{Buf, BytesMut};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
};

/// The server's end of a single agency connection
///
/// takes care of the batch framing, so the session only deals with bets.
pub struct ClientConnection<S = TcpStream> {
    buffer: BytesMut,
    stream: S,
    pub client_addr: SocketAddr,
}

#[derive(thiserror::Error, Debug)]
pub enum ConnectionErr {
    #[error("{0}")]
    Io(#[from] tokio::io::Error),

    #[error("{0}")]
    Malformed(#[from] BetParseErr),

    #[error("The batch is not valid utf-8")]
    NotUtf8,

    #[error("The batch is too long")]
    BatchIsTooLong,
}

impl<S> ClientConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, client_addr: SocketAddr) -> Self {
        Self {
            buffer: BytesMut::new(),
            stream,
            client_addr,
        }
    }

    /// reads a whole batch from the agency and returns its bets.
    ///
    /// the peer closing the connection before the terminator, even before
    /// sending anything, is an error: every agency is expected to send a batch.
    pub async fn receive_messages(&mut self) -> Result<Vec<Bet>, ConnectionErr> {
        let batch = self.read_until(BATCH_TERMINATOR as u8).await?;
        let batch = String::from_utf8(batch).map_err(|_| ConnectionErr::NotUtf8)?;
        tracing::debug!("received batch: {:?}", batch);

        Ok(bet_protocol::decode_batch(&batch)?)
    }

    /// sends a single message to the agency
    ///
    /// returns false if the message couldn't be delivered
    pub async fn send_message(&mut self, message: &str) -> bool {
        let mut frame = Vec::with_capacity(message.len() + 1);
        frame.extend_from_slice(message.as_bytes());
        frame.push(BATCH_TERMINATOR as u8);

        let result = async {
            self.stream.write_all(&frame).await?;
            self.stream.flush().await
        }
        .await;

        if let Err(err) = result {
            tracing::debug!("failed to send {:?} to {}: {}", message, self.client_addr, err);
            return false;
        }

        true
    }

    /// closes the connection, the peer will observe EOF
    pub async fn close(mut self) {
        let _ = self.stream.shutdown().await;
    }

    // returns the block of data preceding 'expected_byte', excluding it
    async fn read_until(&mut self, expected_byte: u8) -> Result<Vec<u8>, ConnectionErr> {
        let mut position = 0;

        loop {
            if let Some(offset) = self.buffer[position..]
                .iter()
                .position(|byte| *byte == expected_byte)
            {
                let idx = position + offset;
                if idx > MAX_BATCH_LEN {
                    return Err(ConnectionErr::BatchIsTooLong);
                }

                let block = self.buffer[..idx].to_vec();
                self.buffer.advance(idx + 1);
                return Ok(block);
            }

            position = self.buffer.len();
            if position > MAX_BATCH_LEN {
                return Err(ConnectionErr::BatchIsTooLong);
            }

            let rcount = self.stream.read_buf(&mut self.buffer).await?;
            if rcount == 0 {
                return Err(tokio::io::Error::new(
                    tokio::io::ErrorKind::UnexpectedEof,
                    "the agency disconnected before completing its batch",
                )
                .into());
            }
        }
    }
}
