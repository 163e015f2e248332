//! JSON API over axum.
//!
//! Every route except `/health`, `/signup`, `/login` and `/token/refresh` requires an
//! `Authorization: Bearer <access token>` header.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;

use crate::application::auth::Authenticator;
use crate::application::bank::Bank;
use axum::Router;
use axum::routing::{get, post, put};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub bank: Arc<Bank>,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(bank: Bank, auth: Authenticator) -> Self {
        Self {
            bank: Arc::new(bank),
            auth: Arc::new(auth),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/token/refresh", post(handlers::refresh))
        .route("/transactions", post(handlers::create_transaction))
        .route("/transactions/mine", get(handlers::my_transactions))
        .route("/balance", get(handlers::balance))
        .route("/cards/mine", get(handlers::my_cards))
        .route("/profile", get(handlers::profile))
        .route("/users/:id/update", put(handlers::update_profile))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
