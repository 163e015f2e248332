use crate::domain::user::UserId;
use crate::error::{BankError, Result};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed twelve-digit prefix of every card number.
pub const CARD_PREFIX: &str = "123456789012";

/// Cards are valid for this many days from issue.
pub const CARD_VALIDITY_DAYS: u64 = 365;

/// Largest sequence that still fits the four digits after `CARD_PREFIX`.
pub const MAX_CARD_SEQUENCE: u64 = 9999;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardNumber(String);

impl CardNumber {
    /// Fails once the sequence no longer fits in a sixteen-digit number.
    pub fn from_sequence(sequence: u64) -> Result<Self> {
        if sequence > MAX_CARD_SEQUENCE {
            return Err(BankError::Internal(format!(
                "Card number space exhausted at sequence {sequence}"
            )));
        }
        Ok(Self(format!("{CARD_PREFIX}{sequence:04}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    Active,
    Expired,
    Deactivated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub card_number: CardNumber,
    #[serde(rename = "user")]
    pub owner: UserId,
    #[serde(rename = "card_status")]
    pub status: CardStatus,
    pub created_on: NaiveDate,
    pub expiry_date: NaiveDate,
}

impl Card {
    pub fn issue(card_number: CardNumber, owner: UserId, today: NaiveDate) -> Self {
        Self {
            card_number,
            owner,
            status: CardStatus::Active,
            created_on: today,
            expiry_date: today + Days::new(CARD_VALIDITY_DAYS),
        }
    }

    /// The status as of `today`: an active card past its expiry date reports `Expired`.
    pub fn status_on(&self, today: NaiveDate) -> CardStatus {
        match self.status {
            CardStatus::Active if today > self.expiry_date => CardStatus::Expired,
            status => status,
        }
    }
}
