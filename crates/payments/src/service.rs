//! Payment workflow over the store and a gateway.

use std::sync::Arc;

use common::{OrderId, UserId};
use serde::{Deserialize, Serialize};
use store::{Order, PaymentRecord, Store, StoreError};

use crate::error::PaymentError;
use crate::gateway::PaymentGateway;

/// Every charge is made in Indian rupees.
pub const CURRENCY: &str = "INR";

/// Merchant details shown in the checkout widget.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub display_name: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            display_name: "T-Shirt Store".to_string(),
        }
    }
}

/// Everything the frontend needs to open the checkout widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkout {
    pub razorpay_order_id: String,
    /// Minor units (paise).
    pub amount: i64,
    pub currency: String,
    pub name: String,
    pub key: String,
}

/// Identifiers the checkout widget returns after a payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PaymentConfirmation {
    #[serde(default)]
    pub razorpay_order_id: String,
    #[serde(default)]
    pub razorpay_payment_id: String,
    #[serde(default)]
    pub razorpay_signature: String,
}

/// Service that initiates and verifies payments.
pub struct PaymentService<S: Store> {
    store: S,
    gateway: Arc<dyn PaymentGateway>,
    checkout: CheckoutConfig,
}

impl<S: Store> PaymentService<S> {
    pub fn new(store: S, gateway: Arc<dyn PaymentGateway>, checkout: CheckoutConfig) -> Self {
        Self {
            store,
            gateway,
            checkout,
        }
    }

    /// Registers the caller's order with the gateway and stores the gateway
    /// order id on it.
    #[tracing::instrument(skip(self))]
    pub async fn initiate(
        &self,
        order_id: OrderId,
        customer_id: UserId,
    ) -> Result<Checkout, PaymentError> {
        let order = self
            .store
            .get_order(order_id)
            .await?
            .filter(|o| o.customer_id == customer_id)
            .ok_or(PaymentError::OrderNotFound(order_id))?;

        if !order.total_price.is_positive() {
            return Err(PaymentError::NonPositiveTotal(order_id));
        }

        let amount = order.total_price.minor_units();
        let receipt = format!("order_rcptid_{}", order.id);
        let gateway_order = match self.gateway.create_order(amount, CURRENCY, &receipt).await {
            Ok(gateway_order) => gateway_order,
            Err(e) => {
                tracing::error!(error = %e, "gateway order creation failed");
                metrics::counter!("payments_failed_total", "stage" => "initiate").increment(1);
                return Err(PaymentError::Gateway {
                    details: e.to_string(),
                });
            }
        };

        self.store
            .set_gateway_order_id(order.id, &gateway_order.id)
            .await?
            .ok_or(PaymentError::OrderNotFound(order_id))?;

        tracing::info!(razorpay_order_id = %gateway_order.id, amount, "payment initiated");
        metrics::counter!("payments_initiated_total").increment(1);

        Ok(Checkout {
            razorpay_order_id: gateway_order.id,
            amount,
            currency: CURRENCY.to_string(),
            name: self.checkout.display_name.clone(),
            key: self.gateway.key_id().to_string(),
        })
    }

    /// Confirms a payment: checks the signature, then records the payment,
    /// moves the order to PROCESSING and takes its items out of stock in one
    /// write.
    ///
    /// Succeeds at most once per order. Any failure leaves the order and
    /// stock untouched.
    #[tracing::instrument(skip(self, confirmation), fields(razorpay_order_id = %confirmation.razorpay_order_id))]
    pub async fn verify(&self, confirmation: PaymentConfirmation) -> Result<Order, PaymentError> {
        match self.try_verify(&confirmation).await {
            Ok(order) => {
                tracing::info!(order_id = %order.id, "payment verified");
                metrics::counter!("payments_verified_total").increment(1);
                Ok(order)
            }
            Err(details) => {
                tracing::warn!(details = %details, "payment verification failed");
                metrics::counter!("payments_failed_total", "stage" => "verify").increment(1);
                Err(PaymentError::VerificationFailed { details })
            }
        }
    }

    async fn try_verify(&self, confirmation: &PaymentConfirmation) -> Result<Order, String> {
        self.gateway
            .verify_signature(
                &confirmation.razorpay_order_id,
                &confirmation.razorpay_payment_id,
                &confirmation.razorpay_signature,
            )
            .await
            .map_err(|e| e.to_string())?;

        let order = self
            .store
            .find_order_by_gateway_id(&confirmation.razorpay_order_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| "Order matching query does not exist.".to_string())?;

        let payment = PaymentRecord {
            payment_id: confirmation.razorpay_payment_id.clone(),
            signature: confirmation.razorpay_signature.clone(),
        };
        self.store
            .record_payment(order.id, &payment)
            .await
            .map_err(|e| match e {
                StoreError::NotPending { status, .. } => {
                    format!("Order is already {status}")
                }
                other => other.to_string(),
            })
    }
}
