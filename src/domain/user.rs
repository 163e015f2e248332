use crate::error::{BankError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_PHONE_LEN: usize = 10;
const MAX_NAME_LEN: usize = 30;
const MAX_ADDRESS_LEN: usize = 50;
const MIN_PASSWORD_LEN: usize = 8;

/// Eleven-digit numeric user identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub const LENGTH: usize = 11;

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Draws a random identifier. Uniqueness is enforced by the user store.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let digits = (0..Self::LENGTH)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect();
        Self(digits)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered customer. The phone number doubles as the login username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub dob: Option<NaiveDate>,
    pub is_active: bool,
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

/// Registration input, validated before a `User` is built from it.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    pub password: String,
}

impl NewUser {
    pub fn validate(&self) -> Result<()> {
        validate_phone(&self.phone_number)?;
        validate_name("first_name", &self.first_name)?;
        validate_name("last_name", &self.last_name)?;
        if let Some(email) = non_blank(&self.email) {
            validate_email(email)?;
        }
        if let Some(address) = non_blank(&self.address) {
            validate_address(address)?;
        }
        validate_password(&self.password, &self.phone_number)
    }

    /// Builds the user record; `password_hash` must already be computed.
    pub fn into_user(self, id: UserId, password_hash: String, now: DateTime<Utc>) -> User {
        let email = non_blank(&self.email).map(str::to_string);
        let address = non_blank(&self.address).map(str::to_string);
        User {
            id,
            username: self.phone_number.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone_number: self.phone_number.trim().to_string(),
            email,
            address,
            dob: self.dob,
            is_active: true,
            password_hash,
            date_joined: now,
        }
    }
}

/// Partial profile update. Absent fields are left alone; a blank `email` or `address` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl ProfileUpdate {
    /// Validates every supplied field and applies them to `user`.
    ///
    /// Nothing is written when any field is invalid.
    pub fn apply_to(&self, user: &mut User) -> Result<()> {
        if let Some(first_name) = &self.first_name {
            validate_name("first_name", first_name)?;
        }
        if let Some(last_name) = &self.last_name {
            validate_name("last_name", last_name)?;
        }
        if let Some(phone) = &self.phone_number {
            validate_phone(phone)?;
        }
        if let Some(email) = self.email.as_deref().filter(|e| !e.trim().is_empty()) {
            validate_email(email)?;
        }
        if let Some(address) = self.address.as_deref().filter(|a| !a.trim().is_empty()) {
            validate_address(address)?;
        }

        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.trim().to_string();
        }
        if let Some(phone) = &self.phone_number {
            user.phone_number = phone.trim().to_string();
            user.username = user.phone_number.clone();
        }
        if let Some(email) = &self.email {
            user.email = non_blank_str(email).map(str::to_string);
        }
        if let Some(address) = &self.address {
            user.address = non_blank_str(address).map(str::to_string);
        }
        Ok(())
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().and_then(non_blank_str)
}

fn non_blank_str(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

pub fn validate_phone(phone: &str) -> Result<()> {
    let phone = phone.trim();
    if phone.is_empty() || phone.len() > MAX_PHONE_LEN || !phone.chars().all(|c| c.is_ascii_digit())
    {
        return Err(BankError::Validation(format!(
            "phone_number must be 1 to {MAX_PHONE_LEN} digits."
        )));
    }
    Ok(())
}

fn validate_name(field: &str, value: &str) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BankError::Validation(format!("{field} is required.")));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(BankError::Validation(format!(
            "{field} may not exceed {MAX_NAME_LEN} characters."
        )));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    };
    if !valid {
        return Err(BankError::Validation("Enter a valid email address.".to_string()));
    }
    Ok(())
}

fn validate_address(address: &str) -> Result<()> {
    if address.trim().chars().count() > MAX_ADDRESS_LEN {
        return Err(BankError::Validation(format!(
            "address may not exceed {MAX_ADDRESS_LEN} characters."
        )));
    }
    Ok(())
}

fn validate_password(password: &str, phone: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(BankError::Validation(format!(
            "This password is too short. It must contain at least {MIN_PASSWORD_LEN} characters."
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(BankError::Validation(
            "This password is entirely numeric.".to_string(),
        ));
    }
    if password.trim() == phone.trim() {
        return Err(BankError::Validation(
            "The password is too similar to the phone number.".to_string(),
        ));
    }
    Ok(())
}
