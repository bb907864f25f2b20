//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::{Arc, Mutex};

use chrono::{Days, Utc};
use serial_test::serial;
use sqlx::PgPool;
use store::{
    ActivityWindow, InMemoryStore, Money, NewOrder, NewOrderItem, NewProduct, NewUser, OrderQuery,
    OrderStatus, PaymentRecord, PostgresStore, ProductChanges, ProductFilter, Store, StoreError,
    UserChanges,
};
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use tracing::span;
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            for migration in [
                include_str!("../../../migrations/001_create_storefront_tables.sql"),
                include_str!("../../../migrations/002_add_product_image.sql"),
            ] {
                sqlx::raw_sql(migration).execute(&temp_pool).await.unwrap();
            }
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE order_items, orders, products, users RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .unwrap();

    PostgresStore::new(pool)
}

fn tee(name: &str, price: i64, stock: i64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        description: format!("{name} tee"),
        price: Money::from_major(price),
        stock,
        ..Default::default()
    }
}

fn user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{username}@gmail.com"),
        password_hash: "$argon2id$placeholder".to_string(),
        is_staff: false,
    }
}

#[tokio::test]
#[serial]
async fn product_crud_and_filters() {
    let store = get_test_store().await;

    let plain = store.insert_product(tee("Plain", 100, 5)).await.unwrap();
    let trending = store
        .insert_product(NewProduct {
            is_trending: true,
            ..tee("Trending", 250, 3)
        })
        .await
        .unwrap();

    let all = store.list_products(ProductFilter::new()).await.unwrap();
    assert_eq!(all.len(), 2);

    let only_trending = store
        .list_products(ProductFilter::new().trending())
        .await
        .unwrap();
    assert_eq!(only_trending.len(), 1);
    assert_eq!(only_trending[0].id, trending.id);

    let updated = store
        .update_product(
            plain.id,
            ProductChanges {
                price: Some(Money::from_minor(12_050)),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.price, Money::from_minor(12_050));
    assert_eq!(updated.name, "Plain");
    assert_eq!(updated.image, None);

    let with_image = store
        .update_product(
            trending.id,
            ProductChanges {
                image: Some("products/trending.png".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(with_image.image.as_deref(), Some("products/trending.png"));
    assert_eq!(
        store.get_product(trending.id).await.unwrap().unwrap().image,
        with_image.image
    );

    assert!(store.delete_product(plain.id).await.unwrap());
    assert!(store.get_product(plain.id).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn insert_order_writes_header_and_lines() {
    let store = get_test_store().await;
    let customer = store.insert_user(user("asha")).await.unwrap();
    let product = store.insert_product(tee("Plain", 100, 5)).await.unwrap();

    let order = store
        .insert_order(NewOrder {
            customer_id: customer.id,
            total_price: Money::from_major(340),
            items: vec![NewOrderItem {
                product_id: product.id,
                quantity: 3,
                price: product.price,
            }],
        })
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_price, Money::from_major(340));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 3);

    let listed = store
        .list_orders(&OrderQuery::for_customer(customer.id))
        .await
        .unwrap();
    assert_eq!(listed, vec![order]);
}

#[tokio::test]
#[serial]
async fn insert_order_with_missing_product_rolls_back() {
    let store = get_test_store().await;
    let customer = store.insert_user(user("asha")).await.unwrap();
    let product = store.insert_product(tee("Plain", 100, 5)).await.unwrap();

    let result = store
        .insert_order(NewOrder {
            customer_id: customer.id,
            total_price: Money::from_major(240),
            items: vec![
                NewOrderItem {
                    product_id: product.id,
                    quantity: 1,
                    price: product.price,
                },
                NewOrderItem {
                    product_id: store::ProductId::new(9_999),
                    quantity: 1,
                    price: product.price,
                },
            ],
        })
        .await;

    assert!(matches!(result, Err(StoreError::ProductNotFound(_))));
    let orders = store.list_orders(&OrderQuery::new()).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
#[serial]
async fn record_payment_is_applied_once() {
    let store = get_test_store().await;
    let customer = store.insert_user(user("asha")).await.unwrap();
    let product = store.insert_product(tee("Plain", 100, 5)).await.unwrap();
    let order = store
        .insert_order(NewOrder {
            customer_id: customer.id,
            total_price: Money::from_major(340),
            items: vec![NewOrderItem {
                product_id: product.id,
                quantity: 3,
                price: product.price,
            }],
        })
        .await
        .unwrap();
    store
        .set_gateway_order_id(order.id, "order_test_1")
        .await
        .unwrap();

    let found = store
        .find_order_by_gateway_id("order_test_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, order.id);

    let payment = PaymentRecord {
        payment_id: "pay_1".to_string(),
        signature: "sig_1".to_string(),
    };
    let paid = store.record_payment(order.id, &payment).await.unwrap();
    assert_eq!(paid.status, OrderStatus::Processing);
    assert_eq!(paid.razorpay_signature.as_deref(), Some("sig_1"));

    let stock = store.get_product(product.id).await.unwrap().unwrap().stock;
    assert_eq!(stock, 2);

    let again = store.record_payment(order.id, &payment).await;
    assert!(matches!(again, Err(StoreError::NotPending { .. })));
    let stock = store.get_product(product.id).await.unwrap().unwrap().stock;
    assert_eq!(stock, 2);
}

#[tokio::test]
#[serial]
async fn referenced_product_cannot_be_deleted() {
    let store = get_test_store().await;
    let customer = store.insert_user(user("asha")).await.unwrap();
    let product = store.insert_product(tee("Plain", 100, 5)).await.unwrap();
    store
        .insert_order(NewOrder {
            customer_id: customer.id,
            total_price: Money::from_major(140),
            items: vec![NewOrderItem {
                product_id: product.id,
                quantity: 1,
                price: product.price,
            }],
        })
        .await
        .unwrap();

    let result = store.delete_product(product.id).await;
    assert!(matches!(result, Err(StoreError::ProductInUse(_))));
}

#[tokio::test]
#[serial]
async fn users_are_unique_and_cascade_their_orders() {
    let store = get_test_store().await;
    let asha = store.insert_user(user("asha")).await.unwrap();

    let duplicate = store.insert_user(user("asha")).await;
    assert!(matches!(duplicate, Err(StoreError::DuplicateUsername(_))));

    let promoted = store
        .update_user(
            asha.id,
            UserChanges {
                is_staff: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert!(promoted.is_staff);

    store
        .insert_order(NewOrder {
            customer_id: asha.id,
            total_price: Money::zero(),
            items: vec![],
        })
        .await
        .unwrap();

    assert!(store.delete_user(asha.id).await.unwrap());
    assert!(store.list_orders(&OrderQuery::new()).await.unwrap().is_empty());
    assert!(store.list_users().await.unwrap().is_empty());
}

/// Places the same orders in `store` and moves them to `statuses`.
async fn seed_sales<S: Store>(store: &S, statuses: &[(OrderStatus, u32)]) {
    let customer = store.insert_user(user("asha")).await.unwrap();
    let plain = store.insert_product(tee("Plain", 100, 50)).await.unwrap();
    let graphic = store.insert_product(tee("Graphic", 250, 50)).await.unwrap();

    for &(status, quantity) in statuses {
        let order = store
            .insert_order(NewOrder {
                customer_id: customer.id,
                total_price: plain.price.multiply(quantity) + graphic.price + Money::from_major(40),
                items: vec![
                    NewOrderItem {
                        product_id: plain.id,
                        quantity,
                        price: plain.price,
                    },
                    NewOrderItem {
                        product_id: graphic.id,
                        quantity: 1,
                        price: graphic.price,
                    },
                ],
            })
            .await
            .unwrap();
        store.update_order_status(order.id, status).await.unwrap();
    }
}

#[tokio::test]
#[serial]
async fn grouped_aggregates_match_the_in_memory_fold() {
    let store = get_test_store().await;
    let memory = InMemoryStore::new();
    let sales = [
        (OrderStatus::Delivered, 3),
        (OrderStatus::Shipped, 1),
        (OrderStatus::Pending, 9),
        (OrderStatus::Delivered, 1),
    ];
    seed_sales(&store, &sales).await;
    seed_sales(&memory, &sales).await;

    let today = Utc::now().date_naive();
    let window = ActivityWindow {
        today,
        since: today.checked_sub_days(Days::new(30)).unwrap(),
    };
    let grouped = store.order_activity(window).await.unwrap();

    // 3 * 100 + 250 + 40 and 1 * 100 + 250 + 40
    assert_eq!(grouped.delivered_revenue, Money::from_major(980));
    assert_eq!(grouped.by_status.get(&OrderStatus::Delivered), Some(&2));
    assert_eq!(grouped.by_hour.iter().sum::<u64>(), 4);
    assert_eq!(grouped.by_date.get(&today), Some(&4));
    assert_eq!(grouped.by_weekday.values().sum::<u64>(), 4);
    assert_eq!(grouped, memory.order_activity(window).await.unwrap());

    let top = store.top_sellers(5).await.unwrap();
    let ranked: Vec<_> = top.iter().map(|s| (s.name.as_str(), s.units)).collect();
    assert_eq!(ranked, vec![("Plain", 5), ("Graphic", 3)]);
    assert_eq!(top, memory.top_sellers(5).await.unwrap());

    assert_eq!(store.top_sellers(1).await.unwrap().len(), 1);
}

/// Records the name of every span opened while installed.
#[derive(Clone, Default)]
struct SpanNames(Arc<Mutex<Vec<&'static str>>>);

impl<S: tracing::Subscriber> Layer<S> for SpanNames {
    fn on_new_span(&self, attrs: &span::Attributes<'_>, _id: &span::Id, _ctx: Context<'_, S>) {
        self.0.lock().unwrap().push(attrs.metadata().name());
    }
}

#[tokio::test]
#[serial]
async fn store_calls_open_debug_spans() {
    let store = get_test_store().await;
    let names = SpanNames::default();
    let guard =
        tracing::subscriber::set_default(tracing_subscriber::registry().with(names.clone()));

    let product = store.insert_product(tee("Plain", 100, 5)).await.unwrap();
    store.get_product(product.id).await.unwrap();
    store.list_orders(&OrderQuery::default()).await.unwrap();
    store.top_sellers(5).await.unwrap();
    drop(guard);

    let recorded = names.0.lock().unwrap().clone();
    for name in ["insert_product", "get_product", "list_orders", "top_sellers"] {
        assert!(recorded.contains(&name), "no span for {name}: {recorded:?}");
    }
}
