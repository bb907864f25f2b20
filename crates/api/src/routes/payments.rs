//! Razorpay checkout: gateway order creation and signature verification.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::OrderId;
use domain::Operation;
use payments::{Checkout, PaymentConfirmation};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::extract::{ApiJson, Caller};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InitiateRequest {
    pub order_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub status: &'static str,
}

/// POST /payment/create-order
#[tracing::instrument(skip_all, fields(order_id = ?req.order_id))]
pub async fn create_order<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    ApiJson(req): ApiJson<InitiateRequest>,
) -> Result<Json<Checkout>, ApiError> {
    let principal = caller.require(Operation::InitiatePayment)?;

    let order_id = req
        .order_id
        .map(OrderId::new)
        .ok_or_else(|| ApiError::NotFound("Order not found".to_string()))?;

    let checkout = state.payments.initiate(order_id, principal.user_id).await?;
    Ok(Json(checkout))
}

/// POST /payment/verify
#[tracing::instrument(skip_all, fields(razorpay_order_id = %confirmation.razorpay_order_id))]
pub async fn verify<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    ApiJson(confirmation): ApiJson<PaymentConfirmation>,
) -> Result<Json<VerifyResponse>, ApiError> {
    caller.require(Operation::VerifyPayment)?;

    state.payments.verify(confirmation).await?;
    Ok(Json(VerifyResponse {
        status: "Payment Successful",
    }))
}
