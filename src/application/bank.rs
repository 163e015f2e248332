use crate::application::auth::hash_password;
use crate::application::engine::{Actor, TransactionEngine};
use crate::application::provisioning::AccountProvisioner;
use crate::domain::account::{Account, AccountNumber};
use crate::domain::card::Card;
use crate::domain::ports::{
    CardStore, CardStoreBox, Clock, ClockBox, LedgerStore, LedgerStoreBox, UserStore, UserStoreBox,
};
use crate::domain::transaction::{Transaction, TransactionRequest};
use crate::domain::user::{NewUser, ProfileUpdate, User, UserId};
use crate::error::{BankError, Result};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

/// Attempts at drawing an unused random user id before giving up.
const USER_ID_ATTEMPTS: usize = 5;

/// The bank's use cases, as called by the HTTP API and the command line.
pub struct Bank {
    users: UserStoreBox,
    ledger: LedgerStoreBox,
    cards: CardStoreBox,
    engine: TransactionEngine,
    provisioner: AccountProvisioner,
    clock: ClockBox,
}

impl Bank {
    /// Wires every use case onto a single store and clock.
    pub fn new<S, C>(store: S, clock: C) -> Self
    where
        S: UserStore + LedgerStore + CardStore + Clone + 'static,
        C: Clock + Clone + 'static,
    {
        Self {
            users: Box::new(store.clone()),
            ledger: Box::new(store.clone()),
            cards: Box::new(store.clone()),
            engine: TransactionEngine::new(Box::new(store.clone()), Box::new(clock.clone())),
            provisioner: AccountProvisioner::new(
                Box::new(store.clone()),
                Box::new(store),
                Box::new(clock.clone()),
            ),
            clock: Box::new(clock),
        }
    }

    /// Creates the user and opens their zero-balance account.
    pub async fn register(&self, registration: NewUser) -> Result<(User, Account)> {
        registration.validate()?;
        let phone = registration.phone_number.trim().to_string();
        if self.users.find_by_username(&phone).await?.is_some() {
            return Err(BankError::Conflict(format!("User with phone number {phone}")));
        }

        let password = registration.password.clone();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| BankError::Internal(e.to_string()))??;

        let mut user = None;
        for _ in 0..USER_ID_ATTEMPTS {
            let id = UserId::generate(&mut rand::thread_rng());
            let candidate =
                registration
                    .clone()
                    .into_user(id, password_hash.clone(), self.clock.now());
            match self.users.insert(candidate.clone()).await {
                Ok(()) => {
                    user = Some(candidate);
                    break;
                }
                Err(BankError::Conflict(msg)) => {
                    if self.users.find_by_username(&phone).await?.is_some() {
                        return Err(BankError::Conflict(msg));
                    }
                    debug!("User id collision, drawing another");
                }
                Err(e) => return Err(e),
            }
        }
        let user = user.ok_or_else(|| {
            BankError::Internal("Could not allocate a unique user id".to_string())
        })?;

        let account = match self.provisioner.provision_account(&user.id).await {
            Ok(account) => account,
            Err(e) => {
                // A user without an account must not survive
                error!(user = %user.id, error = %e, "Account provisioning failed, removing user");
                if let Err(cleanup) = self.users.remove(&user.id).await {
                    error!(user = %user.id, error = %cleanup, "Failed to remove unprovisioned user");
                }
                return Err(e);
            }
        };
        info!(user = %user.id, account = %account.number, "User registered");
        Ok((user, account))
    }

    pub async fn issue_card(&self, owner: &UserId) -> Result<Card> {
        self.profile(owner).await?;
        self.provisioner.issue_card(owner).await
    }

    /// Moves money from the caller's account to any other account.
    pub async fn transfer(
        &self,
        caller: &UserId,
        from: AccountNumber,
        to: AccountNumber,
        amount: Decimal,
    ) -> Result<Transaction> {
        self.engine
            .record_transaction(
                &Actor::User(caller.clone()),
                TransactionRequest::transfer(from, to, amount),
            )
            .await
    }

    /// Records a request on the operator's authority.
    pub async fn post(&self, request: TransactionRequest) -> Result<Transaction> {
        self.engine.record_transaction(&Actor::Teller, request).await
    }

    pub async fn account(&self, number: &AccountNumber) -> Result<Account> {
        self.engine.account(number).await
    }

    pub async fn balance(&self, user: &UserId) -> Result<Vec<Account>> {
        self.ledger.accounts_for(user).await
    }

    pub async fn my_transactions(&self, user: &UserId) -> Result<Vec<Transaction>> {
        self.ledger.transactions_for(user).await
    }

    /// The user's cards, with `status` reported as of today.
    pub async fn my_cards(&self, user: &UserId) -> Result<Vec<Card>> {
        let today = self.clock.today();
        let mut cards = self.cards.cards_for(user).await?;
        for card in &mut cards {
            card.status = card.status_on(today);
        }
        Ok(cards)
    }

    pub async fn profile(&self, user: &UserId) -> Result<User> {
        self.users
            .get(user)
            .await?
            .ok_or_else(|| BankError::NotFound(format!("User {user}")))
    }

    pub async fn find_by_phone(&self, phone: &str) -> Result<User> {
        self.users
            .find_by_username(phone.trim())
            .await?
            .ok_or_else(|| BankError::NotFound(format!("User with phone number {}", phone.trim())))
    }

    /// Applies a partial update to `target`'s profile. Only the user themself may do so.
    pub async fn update_profile(
        &self,
        caller: &UserId,
        target: &UserId,
        update: ProfileUpdate,
    ) -> Result<User> {
        if caller != target {
            warn!(caller = %caller, target = %target, "Profile update refused");
            return Err(BankError::Forbidden(
                "You can only update your own profile.".to_string(),
            ));
        }
        let mut user = self.profile(target).await?;
        update.apply_to(&mut user)?;
        self.users.update(user.clone()).await?;
        info!(user = %user.id, "Profile updated");
        Ok(user)
    }
}
