use crate::config::TokenConfig;
use crate::domain::ports::{ClockBox, UserStoreBox};
use crate::domain::user::{User, UserId};
use crate::error::{BankError, Result};
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

/// Hashes a password into an Argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| BankError::PasswordHash(e.to_string()))
}

/// Checks `password` against a stored PHC string.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(password_hash).map_err(|e| BankError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: TokenType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Issues and verifies HS256 bearer tokens.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    clock: ClockBox,
}

impl TokenIssuer {
    pub fn new(config: &TokenConfig, clock: ClockBox) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: Duration::hours(config.access_ttl_hours),
            refresh_ttl: Duration::hours(config.refresh_ttl_hours),
            clock,
        }
    }

    pub fn issue_pair(&self, user: &UserId) -> Result<TokenPair> {
        Ok(TokenPair {
            access: self.issue(user, TokenType::Access)?,
            refresh: self.issue(user, TokenType::Refresh)?,
        })
    }

    pub fn issue(&self, user: &UserId, token_type: TokenType) -> Result<String> {
        let now = self.clock.now();
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            token_type,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Verifies signature, expiry and token type, returning the subject.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<UserId> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| BankError::Unauthorized(format!("Token is invalid or expired: {e}")))?;
        if data.claims.token_type != expected {
            return Err(BankError::Unauthorized(
                "Token has wrong type".to_string(),
            ));
        }
        Ok(UserId::new(data.claims.sub))
    }
}

/// Resolves credentials and bearer tokens to users.
pub struct Authenticator {
    users: UserStoreBox,
    tokens: TokenIssuer,
}

impl Authenticator {
    pub fn new(users: UserStoreBox, tokens: TokenIssuer) -> Self {
        Self { users, tokens }
    }

    /// Checks a username and password, returning a fresh token pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<(TokenPair, User)> {
        let user = match self.users.find_by_username(username.trim()).await? {
            Some(user) if user.is_active => user,
            _ => {
                warn!(username = %username, "Login refused");
                return Err(BankError::InvalidCredentials);
            }
        };

        let password = password.to_string();
        let stored = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| BankError::Internal(e.to_string()))??;
        if !valid {
            warn!(username = %username, "Login refused");
            return Err(BankError::InvalidCredentials);
        }

        let tokens = self.tokens.issue_pair(&user.id)?;
        info!(user = %user.id, "User logged in");
        Ok((tokens, user))
    }

    /// Exchanges a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let id = self.tokens.verify(refresh_token, TokenType::Refresh)?;
        let user = self.active_user(&id).await?;
        self.tokens.issue(&user.id, TokenType::Access)
    }

    /// Resolves an access token to an active user.
    pub async fn authenticate(&self, access_token: &str) -> Result<User> {
        let id = self.tokens.verify(access_token, TokenType::Access)?;
        self.active_user(&id).await
    }

    async fn active_user(&self, id: &UserId) -> Result<User> {
        match self.users.get(id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(BankError::Unauthorized(
                "User not found or inactive".to_string(),
            )),
        }
    }
}
