mod common;

use bank_ledger::application::bank::Bank;
use bank_ledger::domain::ports::{LedgerStore, SystemClock};
use bank_ledger::domain::transaction::{TransactionRequest, TransactionType};
use bank_ledger::error::BankError;
use bank_ledger::infrastructure::in_memory::InMemoryStore;
use common::funded_customer;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_transfer_moves_amount_and_fee() {
    let store = InMemoryStore::new();
    let bank = Bank::new(store.clone(), SystemClock);
    let (alice, a) = funded_customer(&bank, "5550001", dec!(100.00)).await;
    let (bob, b) = funded_customer(&bank, "5550002", dec!(0)).await;

    let tx = bank
        .transfer(&alice.id, a.number.clone(), b.number.clone(), dec!(20.00))
        .await
        .unwrap();

    assert_eq!(tx.fee, dec!(0.40));
    assert_eq!(tx.user, alice.id);
    assert_eq!(bank.account(&a.number).await.unwrap().balance.value(), dec!(79.60));
    assert_eq!(bank.account(&b.number).await.unwrap().balance.value(), dec!(20.00));

    let alice_rows = store.transactions_for(&alice.id).await.unwrap();
    assert_eq!(alice_rows[0].transaction_type, TransactionType::Transfer);
    assert_eq!(alice_rows[0].to_account, Some(b.number.clone()));

    let bob_rows = store.transactions_for(&bob.id).await.unwrap();
    assert_eq!(bob_rows.len(), 1);
    assert_eq!(bob_rows[0].transaction_type, TransactionType::Received);
    assert_eq!(bob_rows[0].amount.value(), dec!(20.00));
    assert_eq!(bob_rows[0].fee, dec!(0.00));
    assert_eq!(bob_rows[0].from_account, Some(a.number.clone()));
}

#[tokio::test]
async fn test_withdrawal_of_entire_balance_is_rejected() {
    let store = InMemoryStore::new();
    let bank = Bank::new(store.clone(), SystemClock);
    let (alice, a) = funded_customer(&bank, "5550001", dec!(10.00)).await;

    let result = bank
        .post(TransactionRequest::withdrawal(a.number.clone(), dec!(10.00)))
        .await;

    assert!(matches!(
        result,
        Err(BankError::InsufficientFunds(TransactionType::Withdrawal))
    ));
    assert_eq!(bank.account(&a.number).await.unwrap().balance.value(), dec!(10.00));
    // Only the opening deposit is on record
    assert_eq!(store.transactions_for(&alice.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_failed_transfer_changes_nothing() {
    let store = InMemoryStore::new();
    let bank = Bank::new(store.clone(), SystemClock);
    let (alice, a) = funded_customer(&bank, "5550001", dec!(20.00)).await;
    let (bob, b) = funded_customer(&bank, "5550002", dec!(5.00)).await;

    // 20.00 + 0.40 fee exceeds the balance
    let result = bank
        .transfer(&alice.id, a.number.clone(), b.number.clone(), dec!(20.00))
        .await;

    assert!(matches!(result, Err(BankError::InsufficientFunds(_))));
    assert_eq!(bank.account(&a.number).await.unwrap().balance.value(), dec!(20.00));
    assert_eq!(bank.account(&b.number).await.unwrap().balance.value(), dec!(5.00));
    assert_eq!(store.transactions_for(&alice.id).await.unwrap().len(), 1);
    assert_eq!(store.transactions_for(&bob.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_minimums_and_positive_deposits() {
    let bank = Bank::new(InMemoryStore::new(), SystemClock);
    let (alice, a) = funded_customer(&bank, "5550001", dec!(50.00)).await;
    let (_bob, b) = funded_customer(&bank, "5550002", dec!(0)).await;

    assert!(matches!(
        bank.post(TransactionRequest::withdrawal(a.number.clone(), dec!(4.99)))
            .await,
        Err(BankError::BelowMinimumAmount(TransactionType::Withdrawal))
    ));
    assert!(matches!(
        bank.transfer(&alice.id, a.number.clone(), b.number.clone(), dec!(4.99))
            .await,
        Err(BankError::BelowMinimumAmount(TransactionType::Transfer))
    ));
    assert!(matches!(
        bank.post(TransactionRequest::deposit(a.number.clone(), dec!(0)))
            .await,
        Err(BankError::NonPositiveAmount)
    ));
    assert!(matches!(
        bank.post(TransactionRequest::deposit(a.number.clone(), dec!(-3)))
            .await,
        Err(BankError::NonPositiveAmount)
    ));

    // Exactly the minimum is fine: 5.00 + 0.10
    bank.post(TransactionRequest::withdrawal(a.number.clone(), dec!(5.00)))
        .await
        .unwrap();
    assert_eq!(bank.account(&a.number).await.unwrap().balance.value(), dec!(44.90));
}

#[tokio::test]
async fn test_unknown_accounts_are_reported() {
    let bank = Bank::new(InMemoryStore::new(), SystemClock);
    let (alice, a) = funded_customer(&bank, "5550001", dec!(50.00)).await;
    let ghost = bank_ledger::domain::account::AccountNumber::from_sequence(99);

    let result = bank
        .transfer(&alice.id, a.number.clone(), ghost.clone(), dec!(10))
        .await;
    assert!(matches!(result, Err(BankError::UnknownAccount(n)) if n == ghost));
    assert_eq!(bank.account(&a.number).await.unwrap().balance.value(), dec!(50.00));
}
