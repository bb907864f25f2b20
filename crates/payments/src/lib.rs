//! Payment processing for the storefront.
//!
//! A [`PaymentGateway`] creates gateway-side orders and checks the signature
//! the checkout widget hands back. [`PaymentService`] drives the two-step
//! flow on top of the store:
//! 1. Initiate: register the order's total with the gateway
//! 2. Verify: check the signature, mark the order paid and take the stock

pub mod error;
pub mod gateway;
pub mod memory;
pub mod razorpay;
pub mod service;
pub mod signature;

pub use error::{GatewayError, PaymentError};
pub use gateway::{GatewayOrder, PaymentGateway};
pub use memory::InMemoryGateway;
pub use razorpay::{RazorpayConfig, RazorpayGateway};
pub use service::{CURRENCY, Checkout, CheckoutConfig, PaymentConfirmation, PaymentService};
