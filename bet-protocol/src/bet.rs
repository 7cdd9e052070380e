use std::{fmt, num::ParseIntError, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{BATCH_TERMINATOR, BET_SEPARATOR, FIELD_SEPARATOR};

const FIELD_COUNT: usize = 6;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single bet placed at an agency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bet {
    pub agency: u32,
    pub first_name: String,
    pub last_name: String,
    pub document: String,
    pub birthdate: NaiveDate,
    pub number: u32,
}

#[derive(thiserror::Error, Debug)]
pub enum BetParseErr {
    #[error("Expected 6 fields, found {0}")]
    WrongFieldCount(usize),

    #[error("Failed to parse a number: {0}")]
    UnknownNumberFormat(#[from] ParseIntError),

    #[error("Failed to parse the birthdate: {0}")]
    UnknownDateFormat(#[from] chrono::ParseError),

    #[error("The field \"{0}\" contains a reserved character")]
    IllegalCharacter(String),
}

impl Bet {
    // text fields must not collide with the framing
    pub(crate) fn check_fields(&self) -> Result<(), BetParseErr> {
        for field in [&self.first_name, &self.last_name, &self.document] {
            let is_reserved =
                |ch: char| matches!(ch, FIELD_SEPARATOR | BET_SEPARATOR | BATCH_TERMINATOR);
            if field.contains(is_reserved) {
                return Err(BetParseErr::IllegalCharacter(field.clone()));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{agency}{sep}{first}{sep}{last}{sep}{document}{sep}{birthdate}{sep}{number}",
            sep = FIELD_SEPARATOR,
            agency = self.agency,
            first = self.first_name,
            last = self.last_name,
            document = self.document,
            birthdate = self.birthdate.format(DATE_FORMAT),
            number = self.number,
        )
    }
}

impl FromStr for Bet {
    type Err = BetParseErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(FIELD_SEPARATOR).collect();
        if parts.len() != FIELD_COUNT {
            return Err(BetParseErr::WrongFieldCount(parts.len()));
        }

        let bet = Self {
            agency: parts[0].trim().parse()?,
            first_name: parts[1].trim().to_string(),
            last_name: parts[2].trim().to_string(),
            document: parts[3].trim().to_string(),
            birthdate: NaiveDate::parse_from_str(parts[4].trim(), DATE_FORMAT)?,
            number: parts[5].trim().parse()?,
        };
        bet.check_fields()?;

        Ok(bet)
    }
}
