use super::account::{Account, AccountNumber};
use super::card::Card;
use super::transaction::Transaction;
use super::user::{User, UserId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

/// Source of the current time, injected so tests can pin it.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Every balance and row written by one engine operation.
///
/// Stores apply a batch all-or-nothing.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LedgerBatch {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` if the id or the username is taken.
    async fn insert(&self, user: User) -> Result<()>;
    /// Fails with `NotFound` for an unknown id and `Conflict` if the new username is taken.
    async fn update(&self, user: User) -> Result<()>;
    /// Deletes the user and frees their username. Removing an unknown id is a no-op.
    async fn remove(&self, id: &UserId) -> Result<()>;
    async fn get(&self, id: &UserId) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a zero-balance account for `owner` under the next sequential account number.
    ///
    /// Fails with `Conflict` if `owner` already holds an account.
    async fn open_account(&self, owner: &UserId, now: DateTime<Utc>) -> Result<Account>;
    async fn get_account(&self, number: &AccountNumber) -> Result<Option<Account>>;
    async fn accounts_for(&self, owner: &UserId) -> Result<Vec<Account>>;
    /// Transactions owned by `user`, newest first.
    async fn transactions_for(&self, user: &UserId) -> Result<Vec<Transaction>>;
    async fn commit(&self, batch: LedgerBatch) -> Result<()>;
}

#[async_trait]
pub trait CardStore: Send + Sync {
    /// Issues a card under the next sequential card number.
    async fn issue_card(&self, owner: &UserId, today: NaiveDate) -> Result<Card>;
    async fn cards_for(&self, owner: &UserId) -> Result<Vec<Card>>;
}

pub type ClockBox = Box<dyn Clock>;
pub type UserStoreBox = Box<dyn UserStore>;
pub type LedgerStoreBox = Box<dyn LedgerStore>;
pub type CardStoreBox = Box<dyn CardStore>;
