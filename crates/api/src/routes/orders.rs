//! Customer order endpoints and the admin status update.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{OrderId, ProductId};
use domain::{Operation, OrderLine, PlaceOrder};
use serde::Deserialize;
use store::Store;

use crate::error::ApiError;
use crate::extract::{ApiJson, Caller};
use crate::state::AppState;
use crate::views::{OrderView, order_view, order_views};

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: i64,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

/// GET /orders — the caller's own orders, newest first.
#[tracing::instrument(skip_all)]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let principal = caller.require(Operation::ListOrders)?;

    let orders = state.orders.list_orders(principal.user_id).await?;
    Ok(Json(order_views(&state.store, orders).await?))
}

/// POST /orders
#[tracing::instrument(skip_all, fields(lines = req.items.len()))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    ApiJson(req): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    let principal = caller.require(Operation::CreateOrder)?;

    let lines = req
        .items
        .into_iter()
        .map(|line| OrderLine::new(ProductId::new(line.product_id), line.quantity))
        .collect();
    let order = state
        .orders
        .place_order(PlaceOrder::new(principal.user_id, lines))
        .await?;

    Ok((StatusCode::CREATED, Json(order_view(&state.store, order).await?)))
}

/// GET /orders/{id} — 404 unless the caller owns the order.
#[tracing::instrument(skip(state, caller))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<OrderView>, ApiError> {
    let principal = caller.require(Operation::RetrieveOrder)?;

    let order = state
        .orders
        .get_order(OrderId::new(id), principal.user_id)
        .await?;
    Ok(Json(order_view(&state.store, order).await?))
}

/// DELETE /orders/{id}
#[tracing::instrument(skip(state, caller))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let principal = caller.require(Operation::DeleteOrder)?;

    state
        .orders
        .delete_order(OrderId::new(id), principal.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /admin/orders/{id}/status
#[tracing::instrument(skip(state, caller, req))]
pub async fn update_status<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> Result<Json<OrderView>, ApiError> {
    caller.require(Operation::UpdateOrderStatus)?;

    let order = state
        .orders
        .update_status(OrderId::new(id), req.status.as_deref())
        .await?;
    Ok(Json(order_view(&state.store, order).await?))
}
