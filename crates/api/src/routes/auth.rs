//! Registration, login and token refresh.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use domain::{Operation, Registration};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::extract::{ApiJson, Caller};
use crate::state::AppState;
use crate::views::SessionView;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// POST /auth/register — creates a customer account and logs it in.
#[tracing::instrument(skip_all, fields(username = %req.username))]
pub async fn register<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    caller.allow(Operation::Register)?;

    let session = state
        .auth
        .register(Registration {
            username: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /auth/login
#[tracing::instrument(skip_all, fields(username = %req.username))]
pub async fn login<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<SessionView>, ApiError> {
    caller.allow(Operation::Login)?;

    let session = state.auth.login(&req.username, &req.password).await?;
    Ok(Json(session.into()))
}

/// POST /auth/token/refresh — trades a refresh token for a new access token.
#[tracing::instrument(skip_all)]
pub async fn refresh<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    caller.allow(Operation::RefreshToken)?;

    let access = state.auth.refresh(&req.refresh).await?;
    Ok(Json(RefreshResponse { access }))
}
