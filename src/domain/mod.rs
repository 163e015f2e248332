//! Domain layer: entities, value objects and the storage ports the application depends on.

pub mod account;
pub mod card;
pub mod ports;
pub mod transaction;
pub mod user;
