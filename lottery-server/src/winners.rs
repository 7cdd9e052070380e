use bet_protocol::Bet;

use crate::storage::{self, BetStorage, StorageErr};

/// Computes the winners out of every stored bet
#[derive(Debug, Clone)]
pub struct WinnerResolver {
    storage: BetStorage,
}

impl WinnerResolver {
    pub fn new(storage: BetStorage) -> Self {
        Self { storage }
    }

    /// returns the winning bets, in storage order
    pub fn find_winners(&self) -> Result<Vec<Bet>, StorageErr> {
        tracing::debug!("loading bets from: {}", self.storage.path().display());
        let winners: Vec<Bet> = self
            .storage
            .load_bets()?
            .into_iter()
            .filter(storage::has_won)
            .collect();

        for winner in &winners {
            tracing::info!(
                action = "get_winners",
                result = "success",
                winner = %format!("{} {}", winner.first_name, winner.last_name),
            );
        }

        Ok(winners)
    }
}
