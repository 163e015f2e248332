//! Application layer orchestrating the domain.
//!
//! `TransactionEngine` applies the ledger rules, `AccountProvisioner` opens accounts and issues
//! cards, `auth` handles passwords and bearer tokens, and `Bank` is the facade the interfaces call.

pub mod auth;
pub mod bank;
pub mod engine;
pub mod provisioning;
