//! Staff registration, approval and admin endpoints.
//!
//! Password hashing is slow on purpose, so every call that hashes or
//! verifies runs on the blocking pool.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::Message;
use crate::accounts::{self, AccountError};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, ApiPath};
use crate::db::repository as repo;
use crate::models::{Admin, CredentialsInput, User};

#[derive(Serialize)]
pub struct UserLoggedIn {
    pub message: &'static str,
    pub user: User,
}

#[derive(Serialize)]
pub struct AdminLoggedIn {
    pub message: &'static str,
    pub admin: Admin,
}

/// On routes addressing an account by id, an unknown id is a 404 rather
/// than a failed login.
fn missing_account(err: AccountError) -> ApiError {
    match err {
        AccountError::UnknownUser => ApiError::not_found("User"),
        AccountError::UnknownAdmin => ApiError::not_found("Admin"),
        other => other.into(),
    }
}

// ─── Staff users ──────────────────────────────────────────────────────────────

pub async fn register(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<CredentialsInput>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    ctx.blocking(move |store, config| accounts::register(store, config, &input))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Message {
            message: "Compte créé. En attente de validation par un administrateur.",
        }),
    ))
}

pub async fn login(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<CredentialsInput>,
) -> Result<Json<UserLoggedIn>, ApiError> {
    let user = ctx
        .blocking(move |store, _| accounts::login(store, &input))
        .await?;
    Ok(Json(UserLoggedIn {
        message: "Connexion réussie",
        user,
    }))
}

pub async fn list_users(State(ctx): State<ApiContext>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(ctx.with_conn(repo::list_users).await?))
}

pub async fn list_pending(State(ctx): State<ApiContext>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(ctx.with_conn(repo::list_pending_users).await?))
}

pub async fn approve(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Message>, ApiError> {
    ctx.blocking(move |store, _| accounts::approve(store, id).map_err(missing_account))
        .await?;
    Ok(Json(Message {
        message: "Utilisateur validé avec succès",
    }))
}

pub async fn delete_user(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Message>, ApiError> {
    ctx.blocking(move |store, _| accounts::remove_user(store, id).map_err(missing_account))
        .await?;
    Ok(Json(Message {
        message: "Utilisateur supprimé",
    }))
}

// ─── Admins ───────────────────────────────────────────────────────────────────

/// 400 once the configured number of admins exists.
pub async fn create_admin(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<CredentialsInput>,
) -> Result<(StatusCode, Json<Admin>), ApiError> {
    let admin = ctx
        .blocking(move |store, config| accounts::create_admin(store, config, &input))
        .await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

pub async fn admin_login(
    State(ctx): State<ApiContext>,
    ApiJson(input): ApiJson<CredentialsInput>,
) -> Result<Json<AdminLoggedIn>, ApiError> {
    let admin = ctx
        .blocking(move |store, _| accounts::admin_login(store, &input))
        .await?;
    Ok(Json(AdminLoggedIn {
        message: "Connexion admin réussie",
        admin,
    }))
}

pub async fn list_admins(State(ctx): State<ApiContext>) -> Result<Json<Vec<Admin>>, ApiError> {
    Ok(Json(ctx.with_conn(repo::list_admins).await?))
}

pub async fn delete_admin(
    State(ctx): State<ApiContext>,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Message>, ApiError> {
    ctx.blocking(move |store, _| accounts::remove_admin(store, id).map_err(missing_account))
        .await?;
    Ok(Json(Message {
        message: "Admin supprimé",
    }))
}
