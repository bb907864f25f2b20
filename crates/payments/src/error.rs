//! Payment error types.

use common::OrderId;
use store::StoreError;
use thiserror::Error;

/// Errors raised by a payment gateway adapter.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("gateway returned {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The gateway answered 2xx with a body we couldn't read.
    #[error("unexpected gateway response: {0}")]
    InvalidResponse(String),

    /// The payment signature doesn't match the order and payment ids.
    #[error("Razorpay Signature Verification Failed")]
    SignatureMismatch,

    /// The gateway refused to do anything (used by the in-memory gateway).
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur in the payment workflow.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The order doesn't exist or belongs to someone else.
    #[error("Order not found")]
    OrderNotFound(OrderId),

    /// Nothing to charge.
    #[error("Order total price must be greater than zero.")]
    NonPositiveTotal(OrderId),

    /// Creating the gateway order failed.
    #[error("Razorpay API error during order creation.")]
    Gateway { details: String },

    /// The payment could not be confirmed; the order is unchanged.
    #[error("Payment Verification Failed")]
    VerificationFailed { details: String },

    /// An error occurred in the store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl PaymentError {
    /// Upstream detail to show alongside the error message, if any.
    pub fn details(&self) -> Option<&str> {
        match self {
            PaymentError::Gateway { details } | PaymentError::VerificationFailed { details } => {
                Some(details)
            }
            _ => None,
        }
    }
}
