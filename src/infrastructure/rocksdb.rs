use crate::domain::account::{Account, AccountNumber};
use crate::domain::card::{Card, CardNumber};
use crate::domain::ports::{CardStore, LedgerBatch, LedgerStore, UserStore};
use crate::domain::transaction::Transaction;
use crate::domain::user::{User, UserId};
use crate::error::{BankError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for user records, keyed by user id.
pub const CF_USERS: &str = "users";
/// Column Family mapping usernames to user ids.
pub const CF_USERNAMES: &str = "usernames";
/// Column Family for account states, keyed by account number.
pub const CF_ACCOUNTS: &str = "accounts";
/// Column Family mapping an owner to their account number (at most one per owner).
pub const CF_ACCOUNT_OWNERS: &str = "account_owners";
/// Column Family for cards, keyed by card number.
pub const CF_CARDS: &str = "cards";
/// Column Family for transaction history, keyed by transaction id.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for sequence counters.
pub const CF_META: &str = "meta";

const ACCOUNT_SEQUENCE: &[u8] = b"sequence/account";
const CARD_SEQUENCE: &[u8] = b"sequence/card";

const COLUMN_FAMILIES: [&str; 7] = [
    CF_USERS,
    CF_USERNAMES,
    CF_ACCOUNTS,
    CF_ACCOUNT_OWNERS,
    CF_CARDS,
    CF_TRANSACTIONS,
    CF_META,
];

/// A persistent store implementation using RocksDB.
///
/// Every mutation is assembled into a single `WriteBatch`, so a ledger commit lands atomically.
/// Writers are serialized through `write_lock`, which also makes the read-check-write of
/// sequences and uniqueness indexes safe within the process.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that every required column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| BankError::Internal(format!("{name} column family not found")))
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf_name: &str,
        key: &[u8],
        value: &T,
    ) -> Result<()> {
        let cf = self.cf(cf_name)?;
        batch.put_cf(cf, key, serde_json::to_vec(value)?);
        Ok(())
    }

    fn scan_json<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }

    fn next_sequence(&self, batch: &mut WriteBatch, key: &[u8]) -> Result<u64> {
        let cf = self.cf(CF_META)?;
        let current = match self.db.get_cf(cf, key)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    BankError::Internal("corrupt sequence counter".to_string())
                })?;
                u64::from_be_bytes(raw)
            }
            None => 0,
        };
        let next = current + 1;
        batch.put_cf(cf, key, next.to_be_bytes());
        Ok(next)
    }
}

#[async_trait]
impl UserStore for RocksDBStore {
    async fn insert(&self, user: User) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if self.db.get_cf(self.cf(CF_USERS)?, user.id.as_str())?.is_some() {
            return Err(BankError::Conflict(format!("User {}", user.id)));
        }
        if self
            .db
            .get_cf(self.cf(CF_USERNAMES)?, user.username.as_bytes())?
            .is_some()
        {
            return Err(BankError::Conflict(format!("User with phone number {}", user.username)));
        }

        let mut batch = WriteBatch::default();
        batch.put_cf(
            self.cf(CF_USERNAMES)?,
            user.username.as_bytes(),
            user.id.as_str(),
        );
        self.put_json(&mut batch, CF_USERS, user.id.as_str().as_bytes(), &user)?;
        self.db.write(batch)?;
        Ok(())
    }

    async fn update(&self, user: User) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let previous: User = self
            .get_json(CF_USERS, user.id.as_str().as_bytes())?
            .ok_or_else(|| BankError::NotFound(format!("User {}", user.id)))?;

        let mut batch = WriteBatch::default();
        if previous.username != user.username {
            let usernames = self.cf(CF_USERNAMES)?;
            if self.db.get_cf(usernames, user.username.as_bytes())?.is_some() {
                return Err(BankError::Conflict(format!("User with phone number {}", user.username)));
            }
            batch.delete_cf(usernames, previous.username.as_bytes());
            batch.put_cf(usernames, user.username.as_bytes(), user.id.as_str());
        }
        self.put_json(&mut batch, CF_USERS, user.id.as_str().as_bytes(), &user)?;
        self.db.write(batch)?;
        Ok(())
    }

    async fn remove(&self, id: &UserId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let Some(user) = self.get_json::<User>(CF_USERS, id.as_str().as_bytes())? else {
            return Ok(());
        };
        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_USERNAMES)?, user.username.as_bytes());
        batch.delete_cf(self.cf(CF_USERS)?, id.as_str());
        self.db.write(batch)?;
        Ok(())
    }

    async fn get(&self, id: &UserId) -> Result<Option<User>> {
        self.get_json(CF_USERS, id.as_str().as_bytes())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.db.get_cf(self.cf(CF_USERNAMES)?, username.as_bytes())? {
            Some(id) => self.get_json(CF_USERS, &id),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl LedgerStore for RocksDBStore {
    async fn open_account(&self, owner: &UserId, now: DateTime<Utc>) -> Result<Account> {
        let _guard = self.write_lock.lock().await;
        let owners = self.cf(CF_ACCOUNT_OWNERS)?;
        if self.db.get_cf(owners, owner.as_str())?.is_some() {
            return Err(BankError::Conflict(format!("Account for user {owner}")));
        }

        let mut batch = WriteBatch::default();
        let sequence = self.next_sequence(&mut batch, ACCOUNT_SEQUENCE)?;
        let account = Account::open(AccountNumber::from_sequence(sequence), owner.clone(), now);
        batch.put_cf(owners, owner.as_str(), account.number.as_str());
        self.put_json(
            &mut batch,
            CF_ACCOUNTS,
            account.number.as_str().as_bytes(),
            &account,
        )?;
        self.db.write(batch)?;
        Ok(account)
    }

    async fn get_account(&self, number: &AccountNumber) -> Result<Option<Account>> {
        self.get_json(CF_ACCOUNTS, number.as_str().as_bytes())
    }

    async fn accounts_for(&self, owner: &UserId) -> Result<Vec<Account>> {
        match self.db.get_cf(self.cf(CF_ACCOUNT_OWNERS)?, owner.as_str())? {
            Some(number) => Ok(self
                .get_json::<Account>(CF_ACCOUNTS, &number)?
                .into_iter()
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    async fn transactions_for(&self, user: &UserId) -> Result<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = self
            .scan_json::<Transaction>(CF_TRANSACTIONS)?
            .into_iter()
            .filter(|tx| &tx.user == user)
            .collect();
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(transactions)
    }

    async fn commit(&self, batch: LedgerBatch) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let accounts = self.cf(CF_ACCOUNTS)?;
        let transactions = self.cf(CF_TRANSACTIONS)?;

        let mut write = WriteBatch::default();
        for account in &batch.accounts {
            let key = account.number.as_str().as_bytes();
            if self.db.get_pinned_cf(accounts, key)?.is_none() {
                return Err(BankError::UnknownAccount(account.number.clone()));
            }
            self.put_json(&mut write, CF_ACCOUNTS, key, account)?;
        }
        let mut incoming = HashSet::with_capacity(batch.transactions.len());
        for tx in &batch.transactions {
            let key = tx.id.0.as_bytes();
            if !incoming.insert(tx.id) || self.db.get_pinned_cf(transactions, key)?.is_some() {
                return Err(BankError::Conflict(format!("Transaction {}", tx.id)));
            }
            self.put_json(&mut write, CF_TRANSACTIONS, key, tx)?;
        }

        self.db.write(write)?;
        Ok(())
    }
}

#[async_trait]
impl CardStore for RocksDBStore {
    async fn issue_card(&self, owner: &UserId, today: NaiveDate) -> Result<Card> {
        let _guard = self.write_lock.lock().await;
        let mut batch = WriteBatch::default();
        let sequence = self.next_sequence(&mut batch, CARD_SEQUENCE)?;
        // An exhausted number space drops the batch, leaving the counter untouched
        let card = Card::issue(CardNumber::from_sequence(sequence)?, owner.clone(), today);
        self.put_json(
            &mut batch,
            CF_CARDS,
            card.card_number.as_str().as_bytes(),
            &card,
        )?;
        self.db.write(batch)?;
        Ok(card)
    }

    async fn cards_for(&self, owner: &UserId) -> Result<Vec<Card>> {
        Ok(self
            .scan_json::<Card>(CF_CARDS)?
            .into_iter()
            .filter(|card| &card.owner == owner)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::Amount;
    use crate::domain::card::MAX_CARD_SEQUENCE;
    use crate::domain::transaction::{TransactionId, TransactionType};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn user(id: &str, phone: &str) -> User {
        User {
            id: UserId::new(id),
            username: phone.to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            phone_number: phone.to_string(),
            email: None,
            address: None,
            dob: None,
            is_active: true,
            password_hash: "hash".to_string(),
            date_joined: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).expect("Failed to open RocksDB");

        for name in COLUMN_FAMILIES {
            assert!(store.db.cf_handle(name).is_some(), "missing {name}");
        }
    }

    #[tokio::test]
    async fn test_rocksdb_user_store() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();

        let alice = user("11111111111", "5550001");
        UserStore::insert(&store, alice.clone()).await.unwrap();

        let retrieved = UserStore::get(&store, &alice.id).await.unwrap().unwrap();
        assert_eq!(retrieved, alice);
        let by_name = store.find_by_username("5550001").await.unwrap().unwrap();
        assert_eq!(by_name.id, alice.id);

        let clash = UserStore::insert(&store, user("22222222222", "5550001")).await;
        assert!(matches!(clash, Err(BankError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_rocksdb_ledger_commit() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let owner = UserId::new("11111111111");

        let mut account = store.open_account(&owner, Utc::now()).await.unwrap();
        assert_eq!(account.number, AccountNumber::from_sequence(1));
        assert!(matches!(
            store.open_account(&owner, Utc::now()).await,
            Err(BankError::Conflict(_))
        ));

        account
            .adjust_balance(dec!(25.00), TransactionType::Deposit, Utc::now())
            .unwrap();
        let tx = Transaction {
            id: TransactionId::new(),
            user: owner.clone(),
            account: account.number.clone(),
            to_account: None,
            from_account: None,
            date: Utc::now(),
            amount: Amount::new(dec!(25.00)).unwrap(),
            transaction_type: TransactionType::Deposit,
            fee: dec!(0.00),
        };
        store
            .commit(LedgerBatch {
                accounts: vec![account.clone()],
                transactions: vec![tx.clone()],
            })
            .await
            .unwrap();

        let stored = store.get_account(&account.number).await.unwrap().unwrap();
        assert_eq!(stored.balance.value(), dec!(25.00));
        assert_eq!(store.transactions_for(&owner).await.unwrap(), vec![tx]);
    }

    #[tokio::test]
    async fn test_rocksdb_user_remove() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let alice = user("11111111111", "5550001");
        UserStore::insert(&store, alice.clone()).await.unwrap();

        store.remove(&alice.id).await.unwrap();
        assert!(UserStore::get(&store, &alice.id).await.unwrap().is_none());
        assert!(store.find_by_username("5550001").await.unwrap().is_none());
        UserStore::insert(&store, user("22222222222", "5550001"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rocksdb_exhausted_card_numbers_keep_counter() {
        let dir = tempdir().unwrap();
        let store = RocksDBStore::open(dir.path()).unwrap();
        let owner = UserId::new("11111111111");
        let today = Utc::now().date_naive();
        let meta = store.cf(CF_META).unwrap();
        store
            .db
            .put_cf(meta, CARD_SEQUENCE, MAX_CARD_SEQUENCE.to_be_bytes())
            .unwrap();

        let result = store.issue_card(&owner, today).await;
        assert!(matches!(result, Err(BankError::Internal(_))));
        assert_eq!(
            store.db.get_cf(meta, CARD_SEQUENCE).unwrap().unwrap(),
            MAX_CARD_SEQUENCE.to_be_bytes().to_vec()
        );
        assert!(store.cards_for(&owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rocksdb_sequences_survive_reopen() {
        let dir = tempdir().unwrap();
        {
            let store = RocksDBStore::open(dir.path()).unwrap();
            store
                .open_account(&UserId::new("11111111111"), Utc::now())
                .await
                .unwrap();
            store
                .issue_card(&UserId::new("11111111111"), Utc::now().date_naive())
                .await
                .unwrap();
        }

        let store = RocksDBStore::open(dir.path()).unwrap();
        let account = store
            .open_account(&UserId::new("22222222222"), Utc::now())
            .await
            .unwrap();
        let card = store
            .issue_card(&UserId::new("22222222222"), Utc::now().date_naive())
            .await
            .unwrap();
        assert_eq!(account.number, AccountNumber::from_sequence(2));
        assert_eq!(card.card_number, CardNumber::from_sequence(2).unwrap());
    }
}
