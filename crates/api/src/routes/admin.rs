//! Admin-only endpoints: analytics, user management, all orders and the
//! static admin configuration.

use std::sync::Arc;

use analytics::{DashboardStats, ProductAnalytics};
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use common::UserId;
use domain::{DomainError, ModelAdmin, Operation, UserUpdate, ValidationError, model_admin};
use serde::Deserialize;
use store::Store;

use crate::error::ApiError;
use crate::extract::{ApiJson, Caller};
use crate::state::AppState;
use crate::views::{OrderView, UserView, order_views};

#[derive(Debug, Default, Deserialize)]
pub struct UserPayload {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub is_staff: Option<bool>,
}

impl From<UserPayload> for UserUpdate {
    fn from(payload: UserPayload) -> Self {
        UserUpdate {
            username: payload.username,
            email: payload.email,
            password: payload.password,
            is_staff: payload.is_staff,
        }
    }
}

/// GET /admin/stats
#[tracing::instrument(skip_all)]
pub async fn stats<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<DashboardStats>, ApiError> {
    caller.require(Operation::DashboardStats)?;
    Ok(Json(state.analytics.dashboard(Utc::now()).await?))
}

/// GET /admin/product-analytics
#[tracing::instrument(skip_all)]
pub async fn product_analytics<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<ProductAnalytics>, ApiError> {
    caller.require(Operation::ProductAnalytics)?;
    Ok(Json(state.analytics.products().await?))
}

/// GET /admin/users — ordered by id.
#[tracing::instrument(skip_all)]
pub async fn list_users<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<Vec<UserView>>, ApiError> {
    caller.require(Operation::ListUsers)?;

    let users = state.auth.list_users().await?;
    Ok(Json(users.iter().map(UserView::from).collect()))
}

/// GET /admin/users/{id}
#[tracing::instrument(skip(state, caller))]
pub async fn get_user<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<UserView>, ApiError> {
    caller.require(Operation::ManageUser)?;

    let user = state.auth.get_user(UserId::new(id)).await?;
    Ok(Json(UserView::from(&user)))
}

/// PUT /admin/users/{id} — username is required.
#[tracing::instrument(skip(state, caller, payload))]
pub async fn replace_user<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UserPayload>,
) -> Result<Json<UserView>, ApiError> {
    caller.require(Operation::ManageUser)?;

    if payload.username.is_none() {
        return Err(DomainError::from(ValidationError::new(
            "username",
            "This field is required.",
        ))
        .into());
    }

    let user = state
        .auth
        .update_user(UserId::new(id), payload.into())
        .await?;
    Ok(Json(UserView::from(&user)))
}

/// PATCH /admin/users/{id}
#[tracing::instrument(skip(state, caller, payload))]
pub async fn update_user<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UserPayload>,
) -> Result<Json<UserView>, ApiError> {
    caller.require(Operation::ManageUser)?;

    let user = state
        .auth
        .update_user(UserId::new(id), payload.into())
        .await?;
    Ok(Json(UserView::from(&user)))
}

/// DELETE /admin/users/{id} — also removes the user's orders.
#[tracing::instrument(skip(state, caller))]
pub async fn delete_user<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    caller.require(Operation::ManageUser)?;

    state.auth.delete_user(UserId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/orders — every order, newest first.
#[tracing::instrument(skip_all)]
pub async fn list_orders<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    caller.require(Operation::ListAllOrders)?;

    let orders = state.orders.list_all_orders().await?;
    Ok(Json(order_views(&state.store, orders).await?))
}

/// GET /admin/config/{model}
#[tracing::instrument(skip(caller))]
pub async fn config(
    caller: Caller,
    Path(model): Path<String>,
) -> Result<Json<&'static ModelAdmin>, ApiError> {
    caller.require(Operation::AdminConfig)?;

    model_admin(&model)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No admin configuration for '{model}'")))
}
