use crate::domain::account::AccountNumber;
use crate::domain::transaction::TransactionType;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BankError {
    #[error("{0}")]
    Validation(String),
    #[error("Insufficient funds for {0}.")]
    InsufficientFunds(TransactionType),
    #[error("Minimum {0} amount is 5.")]
    BelowMinimumAmount(TransactionType),
    #[error("Deposit amount must be positive.")]
    NonPositiveAmount,
    #[error("A {0} must have a source account.")]
    MissingAccount(TransactionType),
    #[error("Transfer must specify both from and to accounts.")]
    MissingDestination,
    #[error("Cannot transfer to the same account.")]
    SameAccount,
    #[error("Received transactions are only created by transfers.")]
    ReceivedNotAllowed,
    #[error("Account {0} does not exist.")]
    UnknownAccount(AccountNumber),
    #[error("Account {0} would exceed the maximum balance.")]
    BalanceLimitExceeded(AccountNumber),
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    Conflict(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
    #[cfg(feature = "storage-rocksdb")]
    #[error("Storage error: {0}")]
    Storage(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BankError {
    /// Whether the error was caused by the caller's input rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::InsufficientFunds(_)
                | Self::BelowMinimumAmount(_)
                | Self::NonPositiveAmount
                | Self::MissingAccount(_)
                | Self::MissingDestination
                | Self::SameAccount
                | Self::ReceivedNotAllowed
                | Self::UnknownAccount(_)
                | Self::BalanceLimitExceeded(_)
                | Self::InvalidCredentials
                | Self::Unauthorized(_)
                | Self::Forbidden(_)
                | Self::NotFound(_)
                | Self::Conflict(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BankError>;
