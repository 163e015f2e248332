//! CSV surface of the teller batch command.

pub mod account_writer;
pub mod transaction_reader;
