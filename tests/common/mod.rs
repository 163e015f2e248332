#![allow(dead_code)]

use bank_ledger::application::bank::Bank;
use bank_ledger::domain::account::Account;
use bank_ledger::domain::transaction::TransactionRequest;
use bank_ledger::domain::user::{NewUser, User};
use rust_decimal::Decimal;
use std::io::Error;
use std::path::Path;

pub const PASSWORD: &str = "analytical-engine";

pub fn registration(phone: &str) -> NewUser {
    NewUser {
        phone_number: phone.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: Some("ada@example.com".to_string()),
        address: None,
        dob: None,
        password: PASSWORD.to_string(),
    }
}

/// Registers a customer and deposits `opening` into their account.
pub async fn funded_customer(bank: &Bank, phone: &str, opening: Decimal) -> (User, Account) {
    let (user, account) = bank.register(registration(phone)).await.unwrap();
    if opening > Decimal::ZERO {
        bank.post(TransactionRequest::deposit(account.number.clone(), opening))
            .await
            .unwrap();
    }
    let account = bank.account(&account.number).await.unwrap();
    (user, account)
}

pub fn write_csv(path: &Path, rows: &[[&str; 4]]) -> Result<(), Error> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["type", "account", "to_account", "amount"])?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}
