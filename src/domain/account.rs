use crate::domain::transaction::TransactionType;
use crate::domain::user::UserId;
use crate::error::{BankError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed twelve-digit prefix shared by every account number this bank issues.
pub const BANK_PREFIX: &str = "098765432100";

/// Monetary values carry exactly two decimal places.
pub const MONEY_SCALE: u32 = 2;

/// Largest amount or balance representable (ten digits, two of them decimals).
pub const MAX_MONEY: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, MONEY_SCALE);

/// Represents a non-negative account balance with two decimal places.
///
/// The only way to change a balance is `Account::adjust_balance`, which refuses any adjustment
/// that would take it below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Balance(Decimal);

/// Represents a positive monetary amount for transactions.
///
/// Ensures that transaction amounts are positive, have at most two decimal places and fit the
/// ledger's column width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(BankError::NonPositiveAmount);
        }
        if value.normalize().scale() > MONEY_SCALE {
            return Err(BankError::Validation(
                "Amounts may have at most 2 decimal places.".to_string(),
            ));
        }
        if value > MAX_MONEY {
            return Err(BankError::Validation(format!(
                "Amounts may not exceed {MAX_MONEY}."
            )));
        }
        Ok(Self(to_money(value)))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = BankError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, MONEY_SCALE));

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Rescales a decimal to the ledger's two-place representation.
pub fn to_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp(MONEY_SCALE);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Human-readable account identifier (`BANK_PREFIX` + sequence).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_string())
    }

    /// Derives the account number for a store-allocated sequence value.
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("{BANK_PREFIX}{sequence:04}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A customer's ledger account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "account_number")]
    pub number: AccountNumber,
    #[serde(rename = "user")]
    pub owner: UserId,
    pub balance: Balance,
    pub last_edited: DateTime<Utc>,
}

impl Account {
    /// Opens a zero-balance account.
    pub fn open(number: AccountNumber, owner: UserId, now: DateTime<Utc>) -> Self {
        Self {
            number,
            owner,
            balance: Balance::ZERO,
            last_edited: now,
        }
    }

    /// Applies a signed adjustment to the balance.
    ///
    /// Fails with `InsufficientFunds` if the result would be negative and with
    /// `BalanceLimitExceeded` if it would overflow; in both cases the account is untouched.
    pub fn adjust_balance(
        &mut self,
        delta: Decimal,
        kind: TransactionType,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let new_balance = self.balance.0 + delta;
        if new_balance < Decimal::ZERO {
            return Err(BankError::InsufficientFunds(kind));
        }
        if new_balance > MAX_MONEY {
            return Err(BankError::BalanceLimitExceeded(self.number.clone()));
        }
        self.balance = Balance(to_money(new_balance));
        self.last_edited = now;
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = Balance(to_money(balance));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account(balance: Decimal) -> Account {
        Account::open(
            AccountNumber::from_sequence(1),
            UserId::new("12345678901"),
            Utc::now(),
        )
        .with_balance(balance)
    }

    #[test]
    fn test_account_number_sequence() {
        assert_eq!(AccountNumber::from_sequence(1).as_str(), "0987654321000001");
        assert_eq!(AccountNumber::from_sequence(42).as_str(), "0987654321000042");
        assert_eq!(AccountNumber::from_sequence(12345).as_str(), "09876543210012345");
    }

    #[test]
    fn test_amount_validation() {
        assert!(Amount::new(dec!(1.0)).is_ok());
        assert!(matches!(
            Amount::new(dec!(0.0)),
            Err(BankError::NonPositiveAmount)
        ));
        assert!(matches!(
            Amount::new(dec!(-1.0)),
            Err(BankError::NonPositiveAmount)
        ));
        assert!(matches!(
            Amount::new(dec!(1.001)),
            Err(BankError::Validation(_))
        ));
        assert!(matches!(
            Amount::new(dec!(100000000.00)),
            Err(BankError::Validation(_))
        ));
    }

    #[test]
    fn test_amount_is_rescaled_to_cents() {
        let amount = Amount::new(dec!(20)).unwrap();
        assert_eq!(amount.to_string(), "20.00");
        let amount = Amount::new(dec!(1.500)).unwrap();
        assert_eq!(amount.to_string(), "1.50");
    }

    #[test]
    fn test_new_account_starts_at_zero() {
        let account = Account::open(
            AccountNumber::from_sequence(7),
            UserId::new("12345678901"),
            Utc::now(),
        );
        assert_eq!(account.balance, Balance::ZERO);
        assert_eq!(account.balance.to_string(), "0.00");
    }

    #[test]
    fn test_adjust_balance_credit_and_debit() {
        let mut account = account(dec!(10.00));
        account
            .adjust_balance(dec!(5.5), TransactionType::Deposit, Utc::now())
            .unwrap();
        assert_eq!(account.balance.value(), dec!(15.50));

        account
            .adjust_balance(dec!(-15.50), TransactionType::Withdrawal, Utc::now())
            .unwrap();
        assert_eq!(account.balance, Balance::ZERO);
    }

    #[test]
    fn test_adjust_balance_never_goes_negative() {
        let mut account = account(dec!(10.00));
        let before = account.clone();

        let result = account.adjust_balance(dec!(-10.20), TransactionType::Withdrawal, Utc::now());
        assert!(matches!(
            result,
            Err(BankError::InsufficientFunds(TransactionType::Withdrawal))
        ));
        assert_eq!(account, before);
    }

    #[test]
    fn test_adjust_balance_respects_limit() {
        let mut account = account(MAX_MONEY);
        let result = account.adjust_balance(dec!(0.01), TransactionType::Received, Utc::now());
        assert!(matches!(result, Err(BankError::BalanceLimitExceeded(_))));
        assert_eq!(account.balance.value(), MAX_MONEY);
    }

    #[test]
    fn test_account_serializes_api_field_names() {
        let account = account(dec!(79.6));
        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["account_number"], "0987654321000001");
        assert_eq!(json["user"], "12345678901");
        assert_eq!(json["balance"], "79.60");
    }
}
