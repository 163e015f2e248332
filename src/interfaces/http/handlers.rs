use super::AppState;
use super::dto::{
    AccessToken, LoginRequest, LoginResponse, RefreshRequest, TransactionCreated,
    TransferRequest, UserMessage, UserSummary,
};
use super::error::ApiError;
use super::extractors::AuthUser;
use crate::domain::account::Account;
use crate::domain::card::Card;
use crate::domain::transaction::Transaction;
use crate::domain::user::{NewUser, ProfileUpdate, UserId};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;

type ApiResult<T> = Result<T, ApiError>;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserMessage>)> {
    let Json(registration) = payload?;
    let (user, _account) = state.bank.register(registration).await?;
    Ok((
        StatusCode::CREATED,
        Json(UserMessage {
            user: user.into(),
            message: "User created successfully.".to_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(request) = payload?;
    let (tokens, user) = state.auth.login(&request.username, &request.password).await?;
    Ok(Json(LoginResponse {
        tokens,
        user: user.into(),
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<AccessToken>> {
    let Json(request) = payload?;
    let access = state.auth.refresh(&request.refresh).await?;
    Ok(Json(AccessToken { access }))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TransactionCreated>)> {
    let Json(request) = payload?;
    let transaction = state
        .bank
        .transfer(
            &user.id,
            request.from_account,
            request.to_account,
            request.amount,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(TransactionCreated {
            message: "Transaction created successfully.".to_string(),
            transaction,
        }),
    ))
}

pub async fn balance(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<Account>>> {
    Ok(Json(state.bank.balance(&user.id).await?))
}

pub async fn my_transactions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<Transaction>>> {
    Ok(Json(state.bank.my_transactions(&user.id).await?))
}

pub async fn my_cards(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<Card>>> {
    Ok(Json(state.bank.my_cards(&user.id).await?))
}

pub async fn profile(AuthUser(user): AuthUser) -> Json<UserSummary> {
    Json(user.into())
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Json<UserMessage>> {
    let Json(update) = payload?;
    let updated = state
        .bank
        .update_profile(&user.id, &UserId::new(id), update)
        .await?;
    Ok(Json(UserMessage {
        user: updated.into(),
        message: "Profile updated successfully.".to_string(),
    }))
}
