use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    NewOrder, NewProduct, NewUser, Order, OrderId, OrderItem, OrderItemId, OrderQuery,
    OrderStatus, PaymentRecord, Product, ProductChanges, ProductFilter, ProductId, Result,
    StoreError, User, UserChanges, UserId, store::Store,
};

#[derive(Default)]
struct Tables {
    products: BTreeMap<ProductId, Product>,
    orders: BTreeMap<OrderId, Order>,
    users: BTreeMap<UserId, User>,
    next_product_id: i64,
    next_order_id: i64,
    next_order_item_id: i64,
    next_user_id: i64,
}

impl Tables {
    fn product_referenced(&self, id: ProductId) -> bool {
        self.orders
            .values()
            .any(|o| o.items.iter().any(|item| item.product_id == id))
    }
}

/// In-memory store implementation for development and testing.
///
/// Every table sits behind one lock, so multi-row writes are atomic with
/// respect to other callers. Ids are assigned sequentially from 1.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.orders.len()
    }

    /// Returns the total number of order lines stored.
    pub async fn order_item_count(&self) -> usize {
        self.tables
            .read()
            .await
            .orders
            .values()
            .map(|o| o.items.len())
            .sum()
    }

    /// Inserts a fully formed order as-is, keeping its ids and timestamp.
    /// Used to seed historical data.
    pub async fn restore_order(&self, order: Order) {
        let mut tables = self.tables.write().await;
        tables.next_order_id = tables.next_order_id.max(order.id.as_i64());
        let max_item = order.items.iter().map(|i| i.id.as_i64()).max().unwrap_or(0);
        tables.next_order_item_id = tables.next_order_item_id.max(max_item);
        tables.orders.insert(order.id, order);
    }
}

fn newest_first<T, K: Ord>(rows: &mut [T], key: impl Fn(&T) -> K) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl Store for InMemoryStore {
    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let mut tables = self.tables.write().await;
        tables.next_product_id += 1;
        let id = ProductId::new(tables.next_product_id);

        let product = Product {
            id,
            name: product.name,
            description: product.description,
            price: product.price,
            stock: product.stock,
            is_featured: product.is_featured,
            is_trending: product.is_trending,
            is_bestseller: product.is_bestseller,
            image: product.image,
            created_at: Utc::now(),
        };
        tables.products.insert(id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.products.get(id).cloned())
            .collect())
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        let tables = self.tables.read().await;
        let mut products: Vec<_> = tables
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        newest_first(&mut products, |p| (p.created_at, p.id));
        Ok(products)
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>> {
        let mut tables = self.tables.write().await;
        Ok(tables.products.get_mut(&id).map(|product| {
            changes.apply_to(product);
            product.clone()
        }))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.product_referenced(id) {
            return Err(StoreError::ProductInUse(id));
        }
        Ok(tables.products.remove(&id).is_some())
    }

    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let mut tables = self.tables.write().await;

        // Validate before assigning any id so a failure leaves nothing behind
        if let Some(missing) = order
            .items
            .iter()
            .find(|item| !tables.products.contains_key(&item.product_id))
        {
            return Err(StoreError::ProductNotFound(missing.product_id));
        }

        tables.next_order_id += 1;
        let order_id = OrderId::new(tables.next_order_id);

        let mut items = Vec::with_capacity(order.items.len());
        for item in order.items {
            tables.next_order_item_id += 1;
            items.push(OrderItem {
                id: OrderItemId::new(tables.next_order_item_id),
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
            });
        }

        let stored = Order {
            id: order_id,
            customer_id: order.customer_id,
            status: OrderStatus::Pending,
            total_price: order.total_price,
            razorpay_order_id: None,
            razorpay_payment_id: None,
            razorpay_signature: None,
            created_at: Utc::now(),
            items,
        };
        tables.orders.insert(order_id, stored.clone());
        Ok(stored)
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.tables.read().await.orders.get(&id).cloned())
    }

    async fn find_order_by_gateway_id(&self, razorpay_order_id: &str) -> Result<Option<Order>> {
        let tables = self.tables.read().await;
        Ok(tables
            .orders
            .values()
            .find(|o| o.razorpay_order_id.as_deref() == Some(razorpay_order_id))
            .cloned())
    }

    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let tables = self.tables.read().await;
        let mut orders: Vec<_> = tables
            .orders
            .values()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();
        newest_first(&mut orders, |o| (o.created_at, o.id));
        Ok(orders)
    }

    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        Ok(self.tables.write().await.orders.remove(&id).is_some())
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>> {
        let mut tables = self.tables.write().await;
        Ok(tables.orders.get_mut(&id).map(|order| {
            order.status = status;
            order.clone()
        }))
    }

    async fn set_gateway_order_id(
        &self,
        id: OrderId,
        razorpay_order_id: &str,
    ) -> Result<Option<Order>> {
        let mut tables = self.tables.write().await;
        Ok(tables.orders.get_mut(&id).map(|order| {
            order.razorpay_order_id = Some(razorpay_order_id.to_string());
            order.clone()
        }))
    }

    async fn record_payment(&self, id: OrderId, payment: &PaymentRecord) -> Result<Order> {
        let mut tables = self.tables.write().await;

        let order = tables.orders.get(&id).ok_or(StoreError::OrderNotFound(id))?;
        if !order.status.awaits_payment() {
            return Err(StoreError::NotPending {
                order_id: id,
                status: order.status,
            });
        }
        let lines: Vec<_> = order
            .items
            .iter()
            .map(|item| (item.product_id, i64::from(item.quantity)))
            .collect();

        for (product_id, quantity) in lines {
            if let Some(product) = tables.products.get_mut(&product_id) {
                product.stock -= quantity;
            }
        }

        let order = tables
            .orders
            .get_mut(&id)
            .ok_or(StoreError::OrderNotFound(id))?;
        order.razorpay_payment_id = Some(payment.payment_id.clone());
        order.razorpay_signature = Some(payment.signature.clone());
        order.status = OrderStatus::Processing;
        Ok(order.clone())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::DuplicateUsername(user.username));
        }

        tables.next_user_id += 1;
        let id = UserId::new(tables.next_user_id);
        let user = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            is_staff: user.is_staff,
            date_joined: Utc::now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(ref username) = changes.username
            && tables
                .users
                .values()
                .any(|u| u.id != id && &u.username == username)
        {
            return Err(StoreError::DuplicateUsername(username.clone()));
        }
        Ok(tables.users.get_mut(&id).map(|user| {
            changes.apply_to(user);
            user.clone()
        }))
    }

    async fn delete_user(&self, id: UserId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.orders.retain(|_, o| o.customer_id != id);
        Ok(true)
    }
}
