use crate::application::auth::TokenPair;
use crate::domain::account::AccountNumber;
use crate::domain::transaction::Transaction;
use crate::domain::user::{User, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub dob: Option<NaiveDate>,
    pub date_joined: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            phone_number: user.phone_number,
            email: user.email,
            address: user.address,
            dob: user.dob,
            date_joined: user.date_joined,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from_account: AccountNumber,
    pub to_account: AccountNumber,
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct UserMessage {
    pub user: UserSummary,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub tokens: TokenPair,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct AccessToken {
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct TransactionCreated {
    pub message: String,
    pub transaction: Transaction,
}
