use crate::domain::account::Account;
use crate::domain::card::Card;
use crate::domain::ports::{CardStoreBox, ClockBox, LedgerStoreBox};
use crate::domain::user::UserId;
use crate::error::{BankError, Result};
use tracing::{debug, info};

/// Opens accounts for new customers and issues their cards.
pub struct AccountProvisioner {
    ledger: LedgerStoreBox,
    cards: CardStoreBox,
    clock: ClockBox,
}

impl AccountProvisioner {
    pub fn new(ledger: LedgerStoreBox, cards: CardStoreBox, clock: ClockBox) -> Self {
        Self {
            ledger,
            cards,
            clock,
        }
    }

    /// Returns the owner's account, opening a zero-balance one if they have none.
    ///
    /// Safe to call repeatedly: the store allows one account per owner, and losing a race
    /// to a concurrent call yields the account that call opened.
    pub async fn provision_account(&self, owner: &UserId) -> Result<Account> {
        if let Some(existing) = self.existing_account(owner).await? {
            debug!(user = %owner, account = %existing.number, "Account already provisioned");
            return Ok(existing);
        }

        match self.ledger.open_account(owner, self.clock.now()).await {
            Ok(account) => {
                info!(user = %owner, account = %account.number, "Account opened");
                Ok(account)
            }
            Err(BankError::Conflict(_)) => self
                .existing_account(owner)
                .await?
                .ok_or_else(|| BankError::Internal(format!("Account for user {owner} vanished"))),
            Err(e) => Err(e),
        }
    }

    pub async fn issue_card(&self, owner: &UserId) -> Result<Card> {
        let card = self.cards.issue_card(owner, self.clock.today()).await?;
        info!(user = %owner, card = %card.card_number, expiry = %card.expiry_date, "Card issued");
        Ok(card)
    }

    async fn existing_account(&self, owner: &UserId) -> Result<Option<Account>> {
        Ok(self.ledger.accounts_for(owner).await?.into_iter().next())
    }
}
