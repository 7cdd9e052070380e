use std::path::Path;

use bet_protocol::Bet;
use chrono::NaiveDate;
use serde::Deserialize;

// a row of the agency's bets file, the agency column is optional
#[derive(Debug, Deserialize)]
struct Row {
    first_name: String,
    last_name: String,
    document: String,
    birthdate: NaiveDate,
    number: u32,
}

/// reads the bets placed at an agency
///
/// every bet is attributed to the given agency
pub fn load(path: &Path, agency: u32) -> Result<Vec<Bet>, csv::Error> {
    let mut reader = csv::Reader::from_path(path)?;

    reader
        .deserialize::<Row>()
        .map(|row| {
            let row = row?;
            Ok(Bet {
                agency,
                first_name: row.first_name,
                last_name: row.last_name,
                document: row.document,
                birthdate: row.birthdate,
                number: row.number,
            })
        })
        .collect()
}
