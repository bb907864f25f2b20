use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};

use crate::{
    ActivityWindow, Money, NewOrder, NewProduct, NewUser, Order, OrderActivity, OrderId,
    OrderItem, OrderItemId, OrderQuery, OrderStatus, PaymentRecord, Product, ProductChanges,
    ProductFilter, ProductId, ProductSales, Result, StoreError, User, UserChanges, UserId,
    store::Store,
};

const PRODUCT_COLUMNS: &str = "id, name, description, price_minor, stock, is_featured, is_trending, is_bestseller, image, created_at";
const ORDER_COLUMNS: &str = "id, customer_id, status, total_price_minor, razorpay_order_id, razorpay_payment_id, razorpay_signature, created_at";
const USER_COLUMNS: &str = "id, username, email, password_hash, is_staff, date_joined";

/// SQLSTATE for foreign key violations.
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to the database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: Money::from_minor(row.try_get("price_minor")?),
            stock: row.try_get("stock")?,
            is_featured: row.try_get("is_featured")?,
            is_trending: row.try_get("is_trending")?,
            is_bestseller: row.try_get("is_bestseller")?,
            image: row.try_get("image")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_user(row: &PgRow) -> Result<User> {
        Ok(User {
            id: UserId::new(row.try_get("id")?),
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            is_staff: row.try_get("is_staff")?,
            date_joined: row.try_get("date_joined")?,
        })
    }

    fn row_to_order_header(row: &PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        Ok(Order {
            id: OrderId::new(row.try_get("id")?),
            customer_id: UserId::new(row.try_get("customer_id")?),
            status,
            total_price: Money::from_minor(row.try_get("total_price_minor")?),
            razorpay_order_id: row.try_get("razorpay_order_id")?,
            razorpay_payment_id: row.try_get("razorpay_payment_id")?,
            razorpay_signature: row.try_get("razorpay_signature")?,
            created_at: row.try_get("created_at")?,
            items: Vec::new(),
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity)
            .map_err(|_| StoreError::Corrupt(format!("quantity out of range: {quantity}")))?;

        Ok(OrderItem {
            id: OrderItemId::new(row.try_get("id")?),
            order_id: OrderId::new(row.try_get("order_id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            quantity,
            price: Money::from_minor(row.try_get("price_minor")?),
        })
    }

    /// Loads the lines of the given order headers and attaches them.
    async fn attach_items(conn: &mut PgConnection, mut orders: Vec<Order>) -> Result<Vec<Order>> {
        if orders.is_empty() {
            return Ok(orders);
        }
        let ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, price_minor
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id ASC
            "#,
        )
        .bind(&ids[..])
        .fetch_all(&mut *conn)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in &rows {
            let item = Self::row_to_item(row)?;
            by_order.entry(item.order_id).or_default().push(item);
        }
        for order in &mut orders {
            order.items = by_order.remove(&order.id).unwrap_or_default();
        }
        Ok(orders)
    }

    async fn load_order(conn: &mut PgConnection, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => {
                let header = Self::row_to_order_header(&row)?;
                let mut orders = Self::attach_items(conn, vec![header]).await?;
                Ok(orders.pop())
            }
            None => Ok(None),
        }
    }
}

/// Reads a `COUNT(*)` or `SUM(...)::BIGINT` column as an unsigned count.
fn count_column(row: &PgRow, column: &str) -> Result<u64> {
    let count: i64 = row.try_get(column)?;
    u64::try_from(count).map_err(|_| StoreError::Corrupt(format!("negative {column}: {count}")))
}

fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.constraint() == Some(constraint))
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION))
}

#[async_trait]
impl Store for PostgresStore {
    #[tracing::instrument(level = "debug", skip(self, product), fields(name = %product.name))]
    async fn insert_product(&self, product: NewProduct) -> Result<Product> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (name, description, price_minor, stock, is_featured, is_trending, is_bestseller, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.minor_units())
        .bind(product.stock)
        .bind(product.is_featured)
        .bind(product.is_trending)
        .bind(product.is_bestseller)
        .bind(&product.image)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_product(&row)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self, ids), fields(count = ids.len()))]
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>> {
        let ids: Vec<i64> = ids.iter().map(ProductId::as_i64).collect();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1)"
        ))
        .bind(&ids[..])
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_product).collect()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1 = FALSE OR is_featured)
              AND ($2 = FALSE OR is_trending)
              AND ($3 = FALSE OR is_bestseller)
              AND ($4::BIGINT IS NULL OR stock < $4)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(filter.featured)
        .bind(filter.trending)
        .bind(filter.bestseller)
        .bind(filter.stock_below)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_product).collect()
    }

    #[tracing::instrument(level = "debug", skip(self, changes))]
    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price_minor = COALESCE($4, price_minor),
                stock = COALESCE($5, stock),
                is_featured = COALESCE($6, is_featured),
                is_trending = COALESCE($7, is_trending),
                is_bestseller = COALESCE($8, is_bestseller),
                image = COALESCE($9, image)
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id.as_i64())
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price.map(|p| p.minor_units()))
        .bind(changes.stock)
        .bind(changes.is_featured)
        .bind(changes.is_trending)
        .bind(changes.is_bestseller)
        .bind(changes.image)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn delete_product(&self, id: ProductId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::ProductInUse(id)
                } else {
                    StoreError::Database(e)
                }
            })?;

        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(level = "debug", skip(self, order), fields(customer_id = ?order.customer_id, lines = order.items.len()))]
    async fn insert_order(&self, order: NewOrder) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let wanted: Vec<i64> = order.items.iter().map(|i| i.product_id.as_i64()).collect();
        let existing: Vec<i64> = sqlx::query_scalar("SELECT id FROM products WHERE id = ANY($1)")
            .bind(&wanted[..])
            .fetch_all(&mut *tx)
            .await?;
        if let Some(missing) = wanted.iter().find(|id| !existing.contains(id)) {
            return Err(StoreError::ProductNotFound(ProductId::new(*missing)));
        }

        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (customer_id, status, total_price_minor)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(order.customer_id.as_i64())
        .bind(OrderStatus::Pending.as_str())
        .bind(order.total_price.minor_units())
        .fetch_one(&mut *tx)
        .await?;

        for item in &order.items {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, product_id, quantity, price_minor)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order_id)
            .bind(item.product_id.as_i64())
            .bind(i64::from(item.quantity))
            .bind(item.price.minor_units())
            .execute(&mut *tx)
            .await?;
        }

        let stored = Self::load_order(&mut *tx, OrderId::new(order_id))
            .await?
            .ok_or(StoreError::OrderNotFound(OrderId::new(order_id)))?;

        tx.commit().await?;
        Ok(stored)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        Self::load_order(&mut *conn, id).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn find_order_by_gateway_id(&self, razorpay_order_id: &str) -> Result<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        let id: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM orders WHERE razorpay_order_id = $1 ORDER BY id ASC LIMIT 1",
        )
        .bind(razorpay_order_id)
        .fetch_optional(&mut *conn)
        .await?;

        match id {
            Some(id) => Self::load_order(&mut *conn, OrderId::new(id)).await,
            None => Ok(None),
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>> {
        let statuses: Option<Vec<String>> = query
            .statuses
            .as_ref()
            .map(|s| s.iter().map(|status| status.as_str().to_string()).collect());

        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE ($1::BIGINT IS NULL OR customer_id = $1)
              AND ($2::TEXT[] IS NULL OR status = ANY($2))
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(query.customer_id.map(|id| id.as_i64()))
        .bind(statuses)
        .fetch_all(&mut *conn)
        .await?;

        let headers = rows
            .iter()
            .map(Self::row_to_order_header)
            .collect::<Result<Vec<_>>>()?;
        Self::attach_items(&mut *conn, headers).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn delete_order(&self, id: OrderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query("UPDATE orders SET status = $2 WHERE id = $1")
            .bind(id.as_i64())
            .bind(status.as_str())
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::load_order(&mut *conn, id).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn set_gateway_order_id(
        &self,
        id: OrderId,
        razorpay_order_id: &str,
    ) -> Result<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query("UPDATE orders SET razorpay_order_id = $2 WHERE id = $1")
            .bind(id.as_i64())
            .bind(razorpay_order_id)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        Self::load_order(&mut *conn, id).await
    }

    #[tracing::instrument(level = "debug", skip(self, payment))]
    async fn record_payment(&self, id: OrderId, payment: &PaymentRecord) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        // Row lock keeps a concurrent verification from decrementing twice
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id.as_i64())
                .fetch_optional(&mut *tx)
                .await?;
        let status = status
            .ok_or(StoreError::OrderNotFound(id))?
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        if !status.awaits_payment() {
            return Err(StoreError::NotPending {
                order_id: id,
                status,
            });
        }

        sqlx::query(
            r#"
            UPDATE orders
            SET razorpay_payment_id = $2, razorpay_signature = $3, status = $4
            WHERE id = $1
            "#,
        )
        .bind(id.as_i64())
        .bind(&payment.payment_id)
        .bind(&payment.signature)
        .bind(OrderStatus::Processing.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE products AS p
            SET stock = p.stock - sold.quantity
            FROM (
                SELECT product_id, SUM(quantity)::BIGINT AS quantity
                FROM order_items
                WHERE order_id = $1
                GROUP BY product_id
            ) AS sold
            WHERE p.id = sold.product_id
            "#,
        )
        .bind(id.as_i64())
        .execute(&mut *tx)
        .await?;

        let order = Self::load_order(&mut *tx, id)
            .await?
            .ok_or(StoreError::OrderNotFound(id))?;

        tx.commit().await?;
        Ok(order)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn order_activity(&self, window: ActivityWindow) -> Result<OrderActivity> {
        let mut conn = self.pool.acquire().await?;
        let mut activity = OrderActivity::default();

        let rows = sqlx::query(
            r#"
            SELECT EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::INT AS year,
                   EXTRACT(MONTH FROM created_at AT TIME ZONE 'UTC')::INT AS month,
                   COUNT(*) AS count
            FROM orders
            GROUP BY 1, 2
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;
        for row in &rows {
            let year: i32 = row.try_get("year")?;
            let month: i32 = row.try_get("month")?;
            let month = u32::try_from(month)
                .map_err(|_| StoreError::Corrupt(format!("month out of range: {month}")))?;
            let count = count_column(row, "count")?;
            activity.by_month.insert((year, month), count);
            *activity.by_year.entry(year).or_default() += count;
        }

        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM orders GROUP BY status")
            .fetch_all(&mut *conn)
            .await?;
        for row in &rows {
            let status: String = row.try_get("status")?;
            let status = status
                .parse::<OrderStatus>()
                .map_err(|e| StoreError::Corrupt(e.to_string()))?;
            activity.by_status.insert(status, count_column(row, "count")?);
        }

        let rows = sqlx::query(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::DATE AS day, COUNT(*) AS count
            FROM orders
            WHERE (created_at AT TIME ZONE 'UTC')::DATE >= $1
            GROUP BY 1
            "#,
        )
        .bind(window.since)
        .fetch_all(&mut *conn)
        .await?;
        for row in &rows {
            activity
                .by_date
                .insert(row.try_get("day")?, count_column(row, "count")?);
        }

        let rows = sqlx::query(
            r#"
            SELECT EXTRACT(HOUR FROM created_at AT TIME ZONE 'UTC')::INT AS hour, COUNT(*) AS count
            FROM orders
            WHERE (created_at AT TIME ZONE 'UTC')::DATE = $1
            GROUP BY 1
            "#,
        )
        .bind(window.today)
        .fetch_all(&mut *conn)
        .await?;
        for row in &rows {
            let hour: i32 = row.try_get("hour")?;
            let slot = usize::try_from(hour)
                .ok()
                .and_then(|h| activity.by_hour.get_mut(h))
                .ok_or_else(|| StoreError::Corrupt(format!("hour out of range: {hour}")))?;
            *slot = count_column(row, "count")?;
        }

        // DOW counts from 0 = Sunday
        let rows = sqlx::query(
            r#"
            SELECT EXTRACT(DOW FROM created_at AT TIME ZONE 'UTC')::INT + 1 AS weekday,
                   COUNT(*) AS count
            FROM orders
            GROUP BY 1
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;
        for row in &rows {
            let weekday: i32 = row.try_get("weekday")?;
            let weekday = u32::try_from(weekday)
                .map_err(|_| StoreError::Corrupt(format!("weekday out of range: {weekday}")))?;
            activity.by_weekday.insert(weekday, count_column(row, "count")?);
        }

        let revenue: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_price_minor), 0)::BIGINT FROM orders WHERE status = $1",
        )
        .bind(OrderStatus::Delivered.as_str())
        .fetch_one(&mut *conn)
        .await?;
        activity.delivered_revenue = Money::from_minor(revenue);

        Ok(activity)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn top_sellers(&self, limit: usize) -> Result<Vec<ProductSales>> {
        let sold: Vec<String> = OrderStatus::ALL
            .iter()
            .filter(|s| s.counts_as_sold())
            .map(|s| s.as_str().to_string())
            .collect();

        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, SUM(oi.quantity)::BIGINT AS units
            FROM order_items AS oi
            JOIN orders AS o ON o.id = oi.order_id
            JOIN products AS p ON p.id = oi.product_id
            WHERE o.status = ANY($1)
            GROUP BY p.id, p.name
            ORDER BY units DESC, p.id ASC
            LIMIT $2
            "#,
        )
        .bind(&sold[..])
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ProductSales {
                    product_id: ProductId::new(row.try_get("id")?),
                    name: row.try_get("name")?,
                    units: count_column(row, "units")?,
                })
            })
            .collect()
    }

    #[tracing::instrument(level = "debug", skip(self, user), fields(username = %user.username))]
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, is_staff)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "unique_username") {
                StoreError::DuplicateUsername(user.username.clone())
            } else {
                StoreError::Database(e)
            }
        })?;

        Self::row_to_user(&row)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self, ids), fields(count = ids.len()))]
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>> {
        let ids: Vec<i64> = ids.iter().map(UserId::as_i64).collect();
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
            .bind(&ids[..])
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_user).collect()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_user).collect()
    }

    #[tracing::instrument(level = "debug", skip(self, changes))]
    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<Option<User>> {
        let username = changes.username.clone();
        let row = sqlx::query(&format!(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                is_staff = COALESCE($5, is_staff)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id.as_i64())
        .bind(changes.username)
        .bind(changes.email)
        .bind(changes.password_hash)
        .bind(changes.is_staff)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, "unique_username") {
                StoreError::DuplicateUsername(username.unwrap_or_default())
            } else {
                StoreError::Database(e)
            }
        })?;

        row.as_ref().map(Self::row_to_user).transpose()
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn delete_user(&self, id: UserId) -> Result<bool> {
        // Orders and their lines go with the user (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
