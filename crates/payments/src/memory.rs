//! In-memory payment gateway for tests and local development.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::GatewayError;
use crate::gateway::{GatewayOrder, PaymentGateway};
use crate::signature;

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    orders: RwLock<Vec<GatewayOrder>>,
    next_id: AtomicU64,
    fail_on_create: AtomicBool,
}

/// Gateway that hands out sequential order ids and signs payments with a
/// local secret, the same way the real checkout does.
#[derive(Debug, Clone)]
pub struct InMemoryGateway {
    key_id: String,
    secret: Vec<u8>,
    state: Arc<InMemoryGatewayState>,
}

impl InMemoryGateway {
    pub fn new(key_id: impl Into<String>, secret: impl Into<Vec<u8>>) -> Self {
        Self {
            key_id: key_id.into(),
            secret: secret.into(),
            state: Arc::default(),
        }
    }

    /// Makes subsequent `create_order` calls fail.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.fail_on_create.store(fail, Ordering::SeqCst);
    }

    /// Signs a payment the way the checkout widget would after a successful
    /// charge.
    pub fn sign_payment(&self, order_id: &str, payment_id: &str) -> Result<String, GatewayError> {
        signature::sign(&self.secret, order_id, payment_id)
    }

    /// Returns every order created so far.
    pub async fn created_orders(&self) -> Vec<GatewayOrder> {
        self.state.orders.read().await.clone()
    }
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new("rzp_test_local", "local-secret")
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        if self.state.fail_on_create.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable(
                "Authentication failed".to_string(),
            ));
        }

        let n = self.state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let order = GatewayOrder {
            id: format!("order_{n:014}"),
            amount,
            currency: currency.to_string(),
            receipt: receipt.to_string(),
        };
        self.state.orders.write().await.push(order.clone());
        Ok(order)
    }

    async fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), GatewayError> {
        signature::verify(&self.secret, order_id, payment_id, signature)
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequential_order_ids() {
        let gateway = InMemoryGateway::default();
        let a = gateway.create_order(34_000, "INR", "order_rcptid_1").await.unwrap();
        let b = gateway.create_order(100, "INR", "order_rcptid_2").await.unwrap();

        assert_eq!(a.id, "order_00000000000001");
        assert_eq!(b.id, "order_00000000000002");
        assert_eq!(gateway.created_orders().await.len(), 2);
    }

    #[tokio::test]
    async fn test_fail_on_create() {
        let gateway = InMemoryGateway::default();
        gateway.set_fail_on_create(true);

        assert!(gateway.create_order(100, "INR", "r").await.is_err());
        assert!(gateway.created_orders().await.is_empty());
    }

    #[tokio::test]
    async fn test_signed_payment_verifies() {
        let gateway = InMemoryGateway::default();
        let sig = gateway.sign_payment("order_1", "pay_1").unwrap();

        assert!(gateway.verify_signature("order_1", "pay_1", &sig).await.is_ok());
        assert!(matches!(
            gateway.verify_signature("order_1", "pay_1", "deadbeef").await,
            Err(GatewayError::SignatureMismatch)
        ));
    }
}
