//! Order placement and order management.

mod pricing;
mod service;

pub use pricing::{SHIPPING_CHARGE, price_order};
pub use service::OrderService;

use common::{ProductId, UserId};
use serde::Deserialize;
use thiserror::Error;

/// One requested line: which product and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl OrderLine {
    pub fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Command to place an order for a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOrder {
    pub customer_id: UserId,
    pub lines: Vec<OrderLine>,
}

impl PlaceOrder {
    pub fn new(customer_id: UserId, lines: Vec<OrderLine>) -> Self {
        Self { customer_id, lines }
    }
}

/// Errors that can occur while placing an order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// A line asks for more units than the product has on hand.
    #[error("Not enough stock for {product_name}. Only {available} available.")]
    InsufficientStock {
        product_id: ProductId,
        product_name: String,
        available: i64,
    },

    /// A line has a zero quantity.
    #[error("Invalid quantity for product {product_id}: must be at least 1")]
    InvalidQuantity { product_id: ProductId },

    /// A line references a product that doesn't exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order total doesn't fit the money representation.
    #[error("Order total is too large.")]
    TotalOverflow,
}
