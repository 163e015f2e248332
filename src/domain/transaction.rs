use crate::domain::account::{AccountNumber, Amount, to_money};
use crate::domain::user::UserId;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Surcharge applied to withdrawals and transfers.
pub const FEE_RATE: Decimal = dec!(0.02);

/// Smallest amount accepted for a withdrawal or a transfer.
pub const MINIMUM_AMOUNT: Decimal = dec!(5.00);

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    Received,
}

impl TransactionType {
    /// Fee charged on top of `amount`.
    pub fn fee_for(self, amount: Amount) -> Decimal {
        match self {
            Self::Withdrawal | Self::Transfer => to_money(amount.value() * FEE_RATE),
            Self::Deposit | Self::Received => to_money(Decimal::ZERO),
        }
    }

    /// Minimum accepted amount, if the type has one.
    pub fn minimum_amount(self) -> Option<Decimal> {
        match self {
            Self::Withdrawal | Self::Transfer => Some(MINIMUM_AMOUNT),
            Self::Deposit | Self::Received => None,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Transfer => "transfer",
            Self::Received => "received",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A persisted, immutable ledger entry.
///
/// `user` is always the owner of `account` at the time the entry was written.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct Transaction {
    pub id: TransactionId,
    pub user: UserId,
    pub account: AccountNumber,
    pub to_account: Option<AccountNumber>,
    pub from_account: Option<AccountNumber>,
    pub date: DateTime<Utc>,
    pub amount: Amount,
    pub transaction_type: TransactionType,
    pub fee: Decimal,
}

/// What a caller asks the engine to record. Account numbers are resolved by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionRequest {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub account: Option<AccountNumber>,
    #[serde(default)]
    pub to_account: Option<AccountNumber>,
    pub amount: Decimal,
}

impl TransactionRequest {
    pub fn deposit(account: AccountNumber, amount: Decimal) -> Self {
        Self {
            kind: TransactionType::Deposit,
            account: Some(account),
            to_account: None,
            amount,
        }
    }

    pub fn withdrawal(account: AccountNumber, amount: Decimal) -> Self {
        Self {
            kind: TransactionType::Withdrawal,
            account: Some(account),
            to_account: None,
            amount,
        }
    }

    pub fn transfer(from: AccountNumber, to: AccountNumber, amount: Decimal) -> Self {
        Self {
            kind: TransactionType::Transfer,
            account: Some(from),
            to_account: Some(to),
            amount,
        }
    }
}
