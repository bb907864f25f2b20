//! Payment gateway trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// An order registered with the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    /// Gateway-assigned order id, e.g. `order_Nx1y2z...`.
    pub id: String,
    /// Amount in minor units (paise).
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

/// Trait for talking to an external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registers an order for `amount` minor units of `currency`.
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError>;

    /// Checks the signature returned by the checkout for a payment.
    async fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), GatewayError>;

    /// Public key id handed to the checkout widget.
    fn key_id(&self) -> &str;
}
