use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
};

use bet_protocol::Bet;

// the number drawn for this lottery
pub const LOTTERY_WINNER_NUMBER: u32 = 7574;

/// A csv file holding every bet received so far
#[derive(Debug, Clone)]
pub struct BetStorage {
    path: PathBuf,
}

#[derive(thiserror::Error, Debug)]
pub enum StorageErr {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),
}

impl BetStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// appends the bets to the storage, creating it if needed
    pub fn store_bets(&self, bets: &[Bet]) -> Result<(), StorageErr> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // an existing but empty file still needs its header
        let is_new = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(is_new)
            .from_writer(file);
        for bet in bets {
            writer.serialize(bet)?;
        }
        // make sure an empty batch still leaves a header behind
        if is_new && bets.is_empty() {
            writer.write_record([
                "agency",
                "first_name",
                "last_name",
                "document",
                "birthdate",
                "number",
            ])?;
        }
        writer.flush()?;

        Ok(())
    }

    /// loads every stored bet, in the order it was stored
    ///
    /// rows that can't be parsed are skipped
    pub fn load_bets(&self) -> Result<Vec<Bet>, StorageErr> {
        if !self.path.exists() {
            return Ok(vec![]);
        }

        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut bets = vec![];
        for (idx, row) in reader.deserialize::<Bet>().enumerate() {
            match row {
                Ok(bet) => bets.push(bet),
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => tracing::warn!(
                    action = "load_bets",
                    result = "fail",
                    row = idx + 1,
                    error = %err,
                ),
            }
        }

        Ok(bets)
    }
}

/// checks whether a bet matches the drawn number
pub fn has_won(bet: &Bet) -> bool {
    bet.number == LOTTERY_WINNER_NUMBER
}
