//! Inbound adapters: the HTTP API and the teller CSV batch format.

pub mod csv;
pub mod http;
