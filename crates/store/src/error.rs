use thiserror::Error;

use crate::{OrderId, OrderStatus, ProductId};

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A user with this username already exists.
    #[error("A user with username '{0}' already exists")]
    DuplicateUsername(String),

    /// The product is referenced by order lines and can't be removed.
    #[error("Product {0} is referenced by existing orders")]
    ProductInUse(ProductId),

    /// A product referenced by a new order line does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Payment can only be recorded once, while the order is still pending.
    #[error("Order {order_id} is {status}, payment can only be recorded for PENDING orders")]
    NotPending {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// A stored row could not be decoded.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
