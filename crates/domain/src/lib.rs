//! Domain layer for the storefront backend.
//!
//! This crate provides the business rules on top of the [`store`] crate:
//! - Order placement with stock validation, frozen prices and shipping
//! - Catalog validation for admin product edits
//! - Registration, login and token issuance
//! - The per-operation access policy and static admin field configuration

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod error;
pub mod order;

pub use admin::{FieldConfig, InlineAdmin, ModelAdmin, model_admin};
pub use auth::{
    Access, AuthError, AuthService, JwtIssuer, Operation, PasswordHasher, Principal,
    Registration, Session, TokenClaims, TokenIssuer, TokenKind, TokenPair, UserUpdate, authorize,
};
pub use catalog::{CatalogService, MAX_PRICE};
pub use error::{DomainError, ValidationError};
pub use order::{OrderError, OrderLine, OrderService, PlaceOrder, SHIPPING_CHARGE, price_order};
