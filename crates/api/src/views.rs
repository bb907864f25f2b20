//! Response bodies.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{Money, OrderId, OrderItemId, ProductId, UserId};
use domain::Session;
use serde::Serialize;
use store::{Order, OrderStatus, Product, Store, StoreError, User};

use crate::media::media_url;

/// A product with its image path turned into a public URL.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub stock: i64,
    pub is_featured: bool,
    pub is_trending: bool,
    pub is_bestseller: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            is_featured: product.is_featured,
            is_trending: product.is_trending,
            is_bestseller: product.is_bestseller,
            image: product.image.as_deref().map(media_url),
            created_at: product.created_at,
        }
    }
}

/// Public view of an account; never includes the password hash.
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            is_staff: user.is_staff,
        }
    }
}

/// Login/registration response, in the shape the frontend stores.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub refresh: String,
    pub access: String,
    pub username: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
    #[serde(rename = "userId")]
    pub user_id: UserId,
}

impl From<Session> for SessionView {
    fn from(session: Session) -> Self {
        Self {
            refresh: session.tokens.refresh,
            access: session.tokens.access,
            username: session.username,
            is_admin: session.is_admin,
            user_id: session.user_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub id: OrderItemId,
    pub product: Option<ProductView>,
    pub quantity: u32,
    pub price: Money,
}

#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub customer: Option<UserView>,
    pub created_at: DateTime<Utc>,
    pub total_price: Money,
    pub status: OrderStatus,
    pub items: Vec<OrderItemView>,
    pub razorpay_order_id: Option<String>,
}

/// Builds order views with customers and products nested, loading each
/// referenced row once.
pub async fn order_views<S: Store>(store: &S, orders: Vec<Order>) -> Result<Vec<OrderView>, StoreError> {
    let mut product_ids: Vec<ProductId> = orders
        .iter()
        .flat_map(|o| o.items.iter().map(|i| i.product_id))
        .collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    let mut customer_ids: Vec<UserId> = orders.iter().map(|o| o.customer_id).collect();
    customer_ids.sort_unstable();
    customer_ids.dedup();

    let products: HashMap<ProductId, Product> = store
        .get_products(&product_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let customers: HashMap<UserId, User> = store
        .get_users(&customer_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok(orders
        .into_iter()
        .map(|order| OrderView {
            id: order.id,
            customer: customers.get(&order.customer_id).map(UserView::from),
            created_at: order.created_at,
            total_price: order.total_price,
            status: order.status,
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemView {
                    id: item.id,
                    product: products
                        .get(&item.product_id)
                        .cloned()
                        .map(ProductView::from),
                    quantity: item.quantity,
                    price: item.price,
                })
                .collect(),
            razorpay_order_id: order.razorpay_order_id,
        })
        .collect())
}

/// Single-order form of [`order_views`].
pub async fn order_view<S: Store>(store: &S, order: Order) -> Result<OrderView, StoreError> {
    let id = order.id;
    order_views(store, vec![order])
        .await?
        .pop()
        .ok_or(StoreError::OrderNotFound(id))
}
