//! Persistence layer for the storefront.
//!
//! The [`Store`] trait is the repository seam every workflow talks to. Writes
//! that touch several rows (placing an order, recording a payment) are atomic:
//! either every row changes or none does.

pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod query;
pub mod stats;
pub mod store;

pub use common::{Money, OrderId, OrderItemId, ProductId, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use model::{
    NewOrder, NewOrderItem, NewProduct, NewUser, Order, OrderItem, OrderStatus, PaymentRecord,
    Product, ProductChanges, UnknownStatus, User, UserChanges,
};
pub use postgres::PostgresStore;
pub use query::{OrderQuery, ProductFilter};
pub use stats::{ActivityWindow, OrderActivity, ProductSales, rank_sales};
pub use store::Store;
