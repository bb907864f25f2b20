//! Shared types for the storefront backend.
//!
//! - Typed row identifiers so product, order and user ids can't be mixed up
//! - [`Money`], a fixed-point amount in minor currency units

pub mod ids;
pub mod money;

pub use ids::{OrderId, OrderItemId, ProductId, UserId};
pub use money::{Money, ParseMoneyError};
