use bet_protocol::{Bet, BetParseErr, ALL_BETS_ACK};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

#[derive(thiserror::Error, Debug)]
pub enum SubmitErr {
    #[error("{0}")]
    Io(#[from] tokio::io::Error),

    #[error("{0}")]
    Encode(#[from] BetParseErr),

    #[error("The server closed the connection without acknowledging the bets")]
    NoAck,

    #[error("Received an unexpected reply: {0}")]
    UnexpectedReply(String),
}

/// sends all the bets as a single batch, and waits for the server to acknowledge them
pub async fn submit<S>(stream: S, bets: &[Bet]) -> Result<(), SubmitErr>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let batch = bet_protocol::encode_batch(bets)?;

    let mut stream = BufReader::new(stream);
    stream.write_all(batch.as_bytes()).await?;
    stream.flush().await?;

    let mut reply = String::new();
    let rcount = stream.read_line(&mut reply).await?;
    if rcount == 0 {
        return Err(SubmitErr::NoAck);
    }

    let reply = reply.trim_end();
    if reply != ALL_BETS_ACK {
        return Err(SubmitErr::UnexpectedReply(reply.to_string()));
    }

    Ok(())
}
