//! Razorpay REST adapter.
//!
//! Orders are created with `POST {api_base}/v1/orders` using HTTP basic auth
//! (key id / key secret). Payment signatures are checked locally.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::gateway::{GatewayOrder, PaymentGateway};
use crate::signature;

pub const DEFAULT_API_BASE: &str = "https://api.razorpay.com";

/// Razorpay credentials and client settings.
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl RazorpayConfig {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    description: String,
}

/// Payment gateway backed by the Razorpay API.
pub struct RazorpayGateway {
    client: Client,
    config: RazorpayConfig,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn orders_url(&self) -> String {
        format!("{}/v1/orders", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    #[tracing::instrument(skip(self))]
    async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder, GatewayError> {
        let response = self
            .client
            .post(self.orders_url())
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&CreateOrderRequest {
                amount,
                currency,
                receipt,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Razorpay wraps failures as {"error": {"code": ..., "description": ...}}
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.description)
                .unwrap_or_else(|_| body.chars().take(200).collect());
            tracing::error!(status = %status, message = %message, "razorpay order creation failed");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let order: GatewayOrder = serde_json::from_str(&body)
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))?;
        tracing::debug!(razorpay_order_id = %order.id, "razorpay order created");
        Ok(order)
    }

    async fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<(), GatewayError> {
        signature::verify(
            self.config.key_secret.as_bytes(),
            order_id,
            payment_id,
            signature,
        )
    }

    fn key_id(&self) -> &str {
        &self.config.key_id
    }
}
