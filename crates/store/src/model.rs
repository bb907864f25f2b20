//! Record types persisted by the store.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Money, OrderId, OrderItemId, ProductId, UserId};

/// The status of an order in its lifecycle.
///
/// ```text
/// PENDING ──► PROCESSING ──► SHIPPED ──► DELIVERED
///    │             │            │
///    └─────────────┴────────────┴──► CANCELLED
/// ```
///
/// Payment verification is the only automatic transition (PENDING to
/// PROCESSING); admins may set any status directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Placed, awaiting payment.
    #[default]
    Pending,

    /// Payment verified, being prepared.
    Processing,

    /// Handed to the courier.
    Shipped,

    /// Received by the customer (terminal state).
    Delivered,

    /// Cancelled (terminal state).
    Cancelled,
}

/// Error for a status string outside [`OrderStatus::ALL`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl std::fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown order status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl OrderStatus {
    /// Every status in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns true if payment can still be recorded.
    pub fn awaits_payment(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }

    /// Returns true for orders whose items count as sold.
    pub fn counts_as_sold(&self) -> bool {
        matches!(self, OrderStatus::Shipped | OrderStatus::Delivered)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    /// Units on hand. Can drop below zero when paid orders oversell.
    pub stock: i64,
    pub is_featured: bool,
    pub is_trending: bool,
    pub is_bestseller: bool,
    /// Path of the uploaded image relative to the media root.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a product that hasn't been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: i64,
    pub is_featured: bool,
    pub is_trending: bool,
    pub is_bestseller: bool,
    pub image: Option<String>,
}

/// Partial update of a product. `None` leaves the field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<i64>,
    pub is_featured: Option<bool>,
    pub is_trending: Option<bool>,
    pub is_bestseller: Option<bool>,
    /// A replacement image. There is no way to clear an existing one.
    pub image: Option<String>,
}

impl ProductChanges {
    /// Applies the changes to a product in place.
    pub fn apply_to(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(flag) = self.is_featured {
            product.is_featured = flag;
        }
        if let Some(flag) = self.is_trending {
            product.is_trending = flag;
        }
        if let Some(flag) = self.is_bestseller {
            product.is_bestseller = flag;
        }
        if let Some(image) = &self.image {
            product.image = Some(image.clone());
        }
    }
}

/// One line of an order, with the unit price frozen at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

impl OrderItem {
    /// Returns `price * quantity`.
    pub fn line_total(&self) -> Money {
        self.price.multiply(self.quantity)
    }
}

/// A customer order together with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: UserId,
    pub status: OrderStatus,
    pub total_price: Money,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Sum of all line totals, without shipping.
    pub fn items_subtotal(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

/// A priced order ready to be written in one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: UserId,
    pub total_price: Money,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Money,
}

/// Gateway identifiers recorded when a payment is verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub signature: String,
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Empty when the user registered without an email.
    pub email: String,
    /// PHC-format password hash.
    pub password_hash: String,
    pub is_staff: bool,
    pub date_joined: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
}

/// Partial update of a user. `None` leaves the field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_staff: Option<bool>,
}

impl UserChanges {
    pub fn apply_to(&self, user: &mut User) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(hash) = &self.password_hash {
            user.password_hash = hash.clone();
        }
        if let Some(is_staff) = self.is_staff {
            user.is_staff = is_staff;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_status_parses_known_values_only() {
        assert_eq!("SHIPPED".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert_eq!("CANCELLED".parse::<OrderStatus>(), Ok(OrderStatus::Cancelled));
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert!("LOST".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        let json = serde_json::to_string(&OrderStatus::Processing).unwrap();
        assert_eq!(json, "\"PROCESSING\"");
        for status in OrderStatus::ALL {
            assert_eq!(status.to_string(), status.as_str());
        }
    }

    #[test]
    fn test_sold_statuses() {
        assert!(OrderStatus::Shipped.counts_as_sold());
        assert!(OrderStatus::Delivered.counts_as_sold());
        assert!(!OrderStatus::Pending.counts_as_sold());
        assert!(!OrderStatus::Processing.counts_as_sold());
        assert!(!OrderStatus::Cancelled.counts_as_sold());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Processing.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_product_changes_only_touch_given_fields() {
        let mut product = Product {
            id: ProductId::new(1),
            name: "Plain Tee".to_string(),
            description: "Cotton".to_string(),
            price: Money::from_major(100),
            stock: 5,
            is_featured: false,
            is_trending: false,
            is_bestseller: false,
            image: None,
            created_at: Utc::now(),
        };
        let changes = ProductChanges {
            price: Some(Money::from_major(120)),
            is_featured: Some(true),
            ..Default::default()
        };
        changes.apply_to(&mut product);

        assert_eq!(product.name, "Plain Tee");
        assert_eq!(product.price, Money::from_major(120));
        assert_eq!(product.stock, 5);
        assert!(product.is_featured);
        assert_eq!(product.image, None);

        ProductChanges {
            image: Some("products/tee.png".to_string()),
            ..Default::default()
        }
        .apply_to(&mut product);
        assert_eq!(product.image.as_deref(), Some("products/tee.png"));

        // No image in the changes keeps the current one
        ProductChanges::default().apply_to(&mut product);
        assert_eq!(product.image.as_deref(), Some("products/tee.png"));
    }

    #[test]
    fn test_items_subtotal() {
        let order = Order {
            id: OrderId::new(1),
            customer_id: UserId::new(1),
            status: OrderStatus::Pending,
            total_price: Money::from_major(340),
            razorpay_order_id: None,
            razorpay_payment_id: None,
            razorpay_signature: None,
            created_at: Utc::now(),
            items: vec![OrderItem {
                id: OrderItemId::new(1),
                order_id: OrderId::new(1),
                product_id: ProductId::new(1),
                quantity: 3,
                price: Money::from_major(100),
            }],
        };
        assert_eq!(order.items_subtotal(), Money::from_major(300));
    }
}
