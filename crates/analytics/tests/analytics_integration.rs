//! Integration tests for analytics over a seeded store.

use analytics::{AnalyticsService, DEFAULT_LOW_STOCK_THRESHOLD};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use common::{Money, OrderId, OrderItemId, ProductId, UserId};
use store::{
    ActivityWindow, InMemoryStore, NewOrder, NewProduct, NewUser, Order, OrderActivity, OrderItem,
    OrderQuery, OrderStatus, PaymentRecord, Product, ProductChanges, ProductFilter, ProductSales,
    Result, Store, StoreError, User, UserChanges,
};

/// Delegates to an in-memory store but fails every full order listing,
/// the way a store too large to scan would be treated.
#[derive(Clone)]
struct NoScanStore(InMemoryStore);

#[async_trait]
impl Store for NoScanStore {
    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        self.0.insert_product(product).await
    }
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        self.0.get_product(id).await
    }
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        self.0.get_products(ids).await
    }
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        self.0.list_products(filter).await
    }
    async fn update_product(&self, id: ProductId, changes: ProductChanges) -> Result<Option<Product>> {
        self.0.update_product(id, changes).await
    }
    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        self.0.delete_product(id).await
    }
    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        self.0.insert_order(order).await
    }
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        self.0.get_order(id).await
    }
    async fn find_order_by_gateway_id(&self, razorpay_order_id: &str) -> Result<Option<Order>> {
        self.0.find_order_by_gateway_id(razorpay_order_id).await
    }
    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        if query.customer_id.is_none() {
            return Err(StoreError::Corrupt("full order scan".to_string()));
        }
        self.0.list_orders(query).await
    }
    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        self.0.delete_order(id).await
    }
    async fn update_order_status(&self, id: OrderId, status: OrderStatus) -> Result<Option<Order>> {
        self.0.update_order_status(id, status).await
    }
    async fn set_gateway_order_id(&self, id: OrderId, razorpay_order_id: &str) -> Result<Option<Order>> {
        self.0.set_gateway_order_id(id, razorpay_order_id).await
    }
    async fn record_payment(&self, id: OrderId, payment: &PaymentRecord) -> Result<Order> {
        self.0.record_payment(id, payment).await
    }
    async fn order_activity(&self, window: ActivityWindow) -> Result<OrderActivity> {
        self.0.order_activity(window).await
    }
    async fn top_sellers(&self, limit: usize) -> Result<Vec<ProductSales>> {
        self.0.top_sellers(limit).await
    }
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        self.0.insert_user(user).await
    }
    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.0.get_user(id).await
    }
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>> {
        self.0.get_users(ids).await
    }
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.0.find_user_by_username(username).await
    }
    async fn list_users(&self) -> Result<Vec<User>> {
        self.0.list_users().await
    }
    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<Option<User>> {
        self.0.update_user(id, changes).await
    }
    async fn delete_user(&self, id: UserId) -> Result<bool> {
        self.0.delete_user(id).await
    }
}

async fn seed_product(store: &InMemoryStore, name: &str, stock: i64) -> Product {
    store
        .insert_product(NewProduct {
            name: name.to_string(),
            price: Money::from_major(100),
            stock,
            ..Default::default()
        })
        .await
        .unwrap()
}

fn historical_order(
    id: i64,
    created_at: DateTime<Utc>,
    status: OrderStatus,
    product: &Product,
    quantity: u32,
) -> Order {
    let items = vec![OrderItem {
        id: OrderItemId::new(id),
        order_id: OrderId::new(id),
        product_id: product.id,
        quantity,
        price: product.price,
    }];
    Order {
        id: OrderId::new(id),
        customer_id: UserId::new(1),
        status,
        total_price: product.price.multiply(quantity) + Money::from_major(40),
        razorpay_order_id: None,
        razorpay_payment_id: None,
        razorpay_signature: None,
        created_at,
        items,
    }
}

#[tokio::test]
async fn dashboard_over_seeded_history() {
    let store = InMemoryStore::new();
    let tee = seed_product(&store, "Plain Tee", 20).await;
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 18, 0, 0).unwrap();

    let history = [
        (Utc.with_ymd_and_hms(2023, 11, 3, 10, 0, 0).unwrap(), OrderStatus::Delivered, 3),
        (Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap(), OrderStatus::Delivered, 1),
        (Utc.with_ymd_and_hms(2024, 6, 15, 9, 45, 0).unwrap(), OrderStatus::Pending, 2),
        (Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(), OrderStatus::Cancelled, 1),
    ];
    for (i, (at, status, qty)) in history.into_iter().enumerate() {
        store
            .restore_order(historical_order(i as i64 + 1, at, status, &tee, qty))
            .await;
    }

    let service = AnalyticsService::new(store.clone(), DEFAULT_LOW_STOCK_THRESHOLD);
    let stats = service.dashboard(now).await.unwrap();

    // 340.00 + 140.00 from the two delivered orders
    assert_eq!(stats.total_revenue, Money::from_major(480));
    assert_eq!(stats.monthly_orders.len(), 2);
    assert_eq!(stats.yearly_orders.len(), 2);
    assert_eq!(stats.daily_orders.len(), 2);
    assert_eq!(stats.hourly_orders_today[9].count, 2);
    assert_eq!(stats.status_distribution.len(), 3);
}

#[tokio::test]
async fn product_analytics_over_seeded_history() {
    let store = InMemoryStore::new();
    let tee = seed_product(&store, "Plain Tee", 20).await;
    let hoodie = seed_product(&store, "Hoodie", 4).await;
    let now = Utc::now();

    store
        .restore_order(historical_order(1, now, OrderStatus::Shipped, &hoodie, 2))
        .await;
    store
        .restore_order(historical_order(2, now, OrderStatus::Delivered, &tee, 5))
        .await;
    store
        .restore_order(historical_order(3, now, OrderStatus::Pending, &hoodie, 9))
        .await;

    let service = AnalyticsService::new(store.clone(), DEFAULT_LOW_STOCK_THRESHOLD);
    let analytics = service.products().await.unwrap();

    assert_eq!(analytics.low_stock_count, 1);
    assert_eq!(analytics.low_stock_alerts[0].name, "Hoodie");
    assert_eq!(analytics.low_stock_alerts[0].current_stock, 4);

    let top: Vec<_> = analytics
        .top_selling_products
        .iter()
        .map(|t| (t.name.as_str(), t.total_sold))
        .collect();
    assert_eq!(top, vec![("Plain Tee", 5), ("Hoodie", 2)]);

    // A stricter threshold flags nothing
    let strict = AnalyticsService::new(store, 1).products().await.unwrap();
    assert_eq!(strict.low_stock_count, 0);
}

#[tokio::test]
async fn service_reads_grouped_counts_not_order_listings() {
    let inner = InMemoryStore::new();
    let tee = seed_product(&inner, "Plain Tee", 3).await;
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 18, 0, 0).unwrap();
    inner
        .restore_order(historical_order(1, now, OrderStatus::Delivered, &tee, 2))
        .await;

    let store = NoScanStore(inner);
    assert!(store.list_orders(&OrderQuery::new()).await.is_err());

    let service = AnalyticsService::new(store, DEFAULT_LOW_STOCK_THRESHOLD);
    let stats = service.dashboard(now).await.unwrap();
    assert_eq!(stats.total_revenue, Money::from_major(240));
    assert_eq!(stats.hourly_orders_today[18].count, 1);

    let analytics = service.products().await.unwrap();
    assert_eq!(analytics.low_stock_count, 1);
    assert_eq!(analytics.top_selling_products[0].total_sold, 2);
}
