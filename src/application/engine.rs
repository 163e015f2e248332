use crate::domain::account::{Account, AccountNumber, Amount};
use crate::domain::ports::{ClockBox, LedgerBatch, LedgerStoreBox};
use crate::domain::transaction::{Transaction, TransactionId, TransactionRequest, TransactionType};
use crate::domain::user::UserId;
use crate::error::{BankError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

/// Who is asking for a transaction to be recorded.
///
/// Passed explicitly on every call; the engine never reads an ambient "current user".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    /// An authenticated customer. May only move money out of an account they own.
    User(UserId),
    /// The bank operator posting deposits and withdrawals on customers' behalf.
    Teller,
}

/// Applies the ledger's business rules to a single transaction request.
///
/// `TransactionEngine` validates the request, computes the fee, adjusts one or two balances and
/// writes the resulting rows through a single `LedgerStore::commit`, so either every effect lands
/// or none does. Operations touching the same account are serialized with per-account locks,
/// always taken in ascending account-number order.
pub struct TransactionEngine {
    ledger: LedgerStoreBox,
    clock: ClockBox,
    locks: Mutex<HashMap<AccountNumber, Arc<Mutex<()>>>>,
}

impl TransactionEngine {
    /// Creates a new `TransactionEngine`.
    ///
    /// # Arguments
    ///
    /// * `ledger` - The store holding accounts and transaction history.
    /// * `clock` - Source of transaction timestamps.
    pub fn new(ledger: LedgerStoreBox, clock: ClockBox) -> Self {
        Self {
            ledger,
            clock,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Validates and applies `request` on behalf of `actor`, returning the persisted transaction.
    ///
    /// For a transfer the returned row is the `transfer` on the source side; its `received` twin
    /// on the destination side is committed in the same batch.
    pub async fn record_transaction(
        &self,
        actor: &Actor,
        request: TransactionRequest,
    ) -> Result<Transaction> {
        let result = self.apply(actor, request.clone()).await;
        match &result {
            Ok(tx) => info!(
                id = %tx.id,
                kind = %tx.transaction_type,
                account = %tx.account,
                amount = %tx.amount,
                fee = %tx.fee,
                "Transaction recorded"
            ),
            Err(e) => warn!(
                kind = %request.kind,
                account = ?request.account,
                amount = %request.amount,
                error = %e,
                "Transaction rejected"
            ),
        }
        result
    }

    async fn apply(&self, actor: &Actor, request: TransactionRequest) -> Result<Transaction> {
        let kind = request.kind;
        if kind == TransactionType::Received {
            return Err(BankError::ReceivedNotAllowed);
        }
        let source_number = request.account.ok_or(BankError::MissingAccount(kind))?;
        let destination_number = match (kind, request.to_account) {
            (TransactionType::Transfer, None) => return Err(BankError::MissingDestination),
            (TransactionType::Transfer, Some(to)) => Some(to),
            _ => None,
        };
        if let Some(minimum) = kind.minimum_amount()
            && request.amount < minimum
        {
            return Err(BankError::BelowMinimumAmount(kind));
        }
        let amount = Amount::new(request.amount)?;
        if destination_number.as_ref() == Some(&source_number) {
            return Err(BankError::SameAccount);
        }

        let mut involved = vec![source_number.clone()];
        involved.extend(destination_number.iter().cloned());
        // Only existing accounts get a lock entry; they are re-read under the lock below
        for number in &involved {
            self.load(number).await?;
        }
        let _guards = self.lock_accounts(involved).await;

        let mut source = self.load(&source_number).await?;
        let mut destination = match &destination_number {
            Some(number) => Some(self.load(number).await?),
            None => None,
        };

        if let Actor::User(user) = actor
            && &source.owner != user
        {
            return Err(BankError::Forbidden(
                "You can only move money out of your own account.".to_string(),
            ));
        }

        let now = self.clock.now();
        let fee = kind.fee_for(amount);
        let mut batch = LedgerBatch::default();

        match kind {
            TransactionType::Deposit => {
                source.adjust_balance(amount.value(), kind, now)?;
            }
            TransactionType::Withdrawal => {
                source.adjust_balance(-(amount.value() + fee), kind, now)?;
            }
            TransactionType::Transfer => {
                source.adjust_balance(-(amount.value() + fee), kind, now)?;
                if let Some(destination) = destination.as_mut() {
                    destination.adjust_balance(amount.value(), TransactionType::Received, now)?;
                    batch.transactions.push(Transaction {
                        id: TransactionId::new(),
                        user: destination.owner.clone(),
                        account: destination.number.clone(),
                        to_account: None,
                        from_account: Some(source.number.clone()),
                        date: now,
                        amount,
                        transaction_type: TransactionType::Received,
                        fee: TransactionType::Received.fee_for(amount),
                    });
                }
            }
            TransactionType::Received => return Err(BankError::ReceivedNotAllowed),
        }

        // The row always belongs to the source account's current owner
        let transaction = Transaction {
            id: TransactionId::new(),
            user: source.owner.clone(),
            account: source.number.clone(),
            to_account: destination.as_ref().map(|account| account.number.clone()),
            from_account: None,
            date: now,
            amount,
            transaction_type: kind,
            fee,
        };
        batch.transactions.insert(0, transaction.clone());
        batch.accounts.push(source);
        batch.accounts.extend(destination);

        self.ledger.commit(batch).await?;
        Ok(transaction)
    }

    async fn load(&self, number: &AccountNumber) -> Result<Account> {
        debug!(account = %number, "Loading account");
        self.ledger
            .get_account(number)
            .await?
            .ok_or_else(|| BankError::UnknownAccount(number.clone()))
    }

    async fn lock_accounts(&self, mut numbers: Vec<AccountNumber>) -> Vec<OwnedMutexGuard<()>> {
        numbers.sort();
        numbers.dedup();

        let handles: Vec<Arc<Mutex<()>>> = {
            let mut locks = self.locks.lock().await;
            numbers
                .into_iter()
                .map(|number| locks.entry(number).or_default().clone())
                .collect()
        };

        let mut guards = Vec::with_capacity(handles.len());
        for handle in handles {
            guards.push(handle.lock_owned().await);
        }
        guards
    }

    /// Current state of an account, as committed.
    pub async fn account(&self, number: &AccountNumber) -> Result<Account> {
        self.load(number).await
    }
}
