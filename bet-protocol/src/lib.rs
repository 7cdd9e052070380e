//! Wire format shared by the lottery server and its agencies.
//!
//! An agency submits one batch per connection: bet messages separated by
//! [`BET_SEPARATOR`] and terminated by [`BATCH_TERMINATOR`]. The server replies
//! with [`ALL_BETS_ACK`] (plus a terminator) once the batch has been stored.

mod bet;

pub use bet::{Bet, BetParseErr};

pub const BET_SEPARATOR: char = '\t';
pub const BATCH_TERMINATOR: char = '\n';
pub const FIELD_SEPARATOR: char = ',';

pub const ALL_BETS_ACK: &str = "ALL_BETS_ACK";

// upper bound on a single batch, terminator excluded
pub const MAX_BATCH_LEN: usize = 1 << 20;

/// Encodes a list of bets into a single batch, terminator included
pub fn encode_batch(bets: &[Bet]) -> Result<String, BetParseErr> {
    let mut batch = String::new();
    for (idx, bet) in bets.iter().enumerate() {
        bet.check_fields()?;
        if idx > 0 {
            batch.push(BET_SEPARATOR);
        }
        batch += &bet.to_string();
    }
    batch.push(BATCH_TERMINATOR);

    Ok(batch)
}

/// Decodes the content of a batch (without its terminator)
///
/// empty messages are skipped, so an empty batch decodes into no bets.
pub fn decode_batch(batch: &str) -> Result<Vec<Bet>, BetParseErr> {
    batch
        .split(BET_SEPARATOR)
        .filter(|message| !message.is_empty())
        .map(|message| message.parse::<Bet>())
        .collect()
}
