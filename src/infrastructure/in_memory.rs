use crate::domain::account::{Account, AccountNumber};
use crate::domain::card::{Card, CardNumber};
use crate::domain::ports::{CardStore, LedgerBatch, LedgerStore, UserStore};
use crate::domain::transaction::{Transaction, TransactionId};
use crate::domain::user::{User, UserId};
use crate::error::{BankError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    usernames: HashMap<String, UserId>,
    accounts: BTreeMap<AccountNumber, Account>,
    account_owners: HashMap<UserId, AccountNumber>,
    transactions: Vec<Transaction>,
    transaction_ids: HashSet<TransactionId>,
    cards: BTreeMap<CardNumber, Card>,
    account_sequence: u64,
    card_sequence: u64,
}

/// A thread-safe in-memory store for users, accounts, cards and transactions.
///
/// All tables live behind a single `Arc<RwLock<..>>`, so a `LedgerBatch` is applied under one
/// write guard and concurrent readers never observe half of it. `Clone` shares the tables.
/// Ideal for testing or deployments where persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert(&self, user: User) -> Result<()> {
        let mut state = self.state.write().await;
        if state.users.contains_key(&user.id) {
            return Err(BankError::Conflict(format!("User {}", user.id)));
        }
        if state.usernames.contains_key(&user.username) {
            return Err(BankError::Conflict(format!("User with phone number {}", user.username)));
        }
        state.usernames.insert(user.username.clone(), user.id.clone());
        state.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn update(&self, user: User) -> Result<()> {
        let mut state = self.state.write().await;
        let previous = state
            .users
            .get(&user.id)
            .map(|existing| existing.username.clone())
            .ok_or_else(|| BankError::NotFound(format!("User {}", user.id)))?;

        if previous != user.username {
            if state.usernames.contains_key(&user.username) {
                return Err(BankError::Conflict(format!("User with phone number {}", user.username)));
            }
            state.usernames.remove(&previous);
            state.usernames.insert(user.username.clone(), user.id.clone());
        }
        state.users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn remove(&self, id: &UserId) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(user) = state.users.remove(id) {
            state.usernames.remove(&user.username);
        }
        Ok(())
    }

    async fn get(&self, id: &UserId) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .usernames
            .get(username)
            .and_then(|id| state.users.get(id))
            .cloned())
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn open_account(&self, owner: &UserId, now: DateTime<Utc>) -> Result<Account> {
        let mut state = self.state.write().await;
        if state.account_owners.contains_key(owner) {
            return Err(BankError::Conflict(format!("Account for user {owner}")));
        }
        state.account_sequence += 1;
        let account = Account::open(
            AccountNumber::from_sequence(state.account_sequence),
            owner.clone(),
            now,
        );
        state
            .account_owners
            .insert(owner.clone(), account.number.clone());
        state.accounts.insert(account.number.clone(), account.clone());
        Ok(account)
    }

    async fn get_account(&self, number: &AccountNumber) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(number).cloned())
    }

    async fn accounts_for(&self, owner: &UserId) -> Result<Vec<Account>> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .filter(|account| &account.owner == owner)
            .cloned()
            .collect())
    }

    async fn transactions_for(&self, user: &UserId) -> Result<Vec<Transaction>> {
        let state = self.state.read().await;
        let mut transactions: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|tx| &tx.user == user)
            .cloned()
            .collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(transactions)
    }

    async fn commit(&self, batch: LedgerBatch) -> Result<()> {
        let mut state = self.state.write().await;
        // Validate the whole batch before touching any table
        if let Some(missing) = batch
            .accounts
            .iter()
            .find(|account| !state.accounts.contains_key(&account.number))
        {
            return Err(BankError::UnknownAccount(missing.number.clone()));
        }
        let mut incoming = HashSet::with_capacity(batch.transactions.len());
        if let Some(duplicate) = batch
            .transactions
            .iter()
            .find(|tx| state.transaction_ids.contains(&tx.id) || !incoming.insert(tx.id))
        {
            return Err(BankError::Conflict(format!("Transaction {}", duplicate.id)));
        }

        for account in batch.accounts {
            state.accounts.insert(account.number.clone(), account);
        }
        state.transaction_ids.extend(incoming);
        state.transactions.extend(batch.transactions);
        Ok(())
    }
}

#[async_trait]
impl CardStore for InMemoryStore {
    async fn issue_card(&self, owner: &UserId, today: NaiveDate) -> Result<Card> {
        let mut state = self.state.write().await;
        let sequence = state.card_sequence + 1;
        let card = Card::issue(CardNumber::from_sequence(sequence)?, owner.clone(), today);
        state.card_sequence = sequence;
        state.cards.insert(card.card_number.clone(), card.clone());
        Ok(card)
    }

    async fn cards_for(&self, owner: &UserId) -> Result<Vec<Card>> {
        let state = self.state.read().await;
        Ok(state
            .cards
            .values()
            .filter(|card| &card.owner == owner)
            .cloned()
            .collect())
    }
}
