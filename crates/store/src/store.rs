use async_trait::async_trait;

use crate::{
    ActivityWindow, NewOrder, NewProduct, NewUser, Order, OrderActivity, OrderId, OrderQuery,
    OrderStatus, PaymentRecord, Product, ProductChanges, ProductFilter, ProductId, ProductSales,
    Result, User, UserChanges, UserId, rank_sales,
};

/// Repository over the catalog, orders and users.
///
/// All implementations must be thread-safe (Send + Sync). Multi-row writes
/// (`insert_order`, `record_payment`, cascading deletes) are atomic.
#[async_trait]
pub trait Store: Send + Sync {
    // -- Products --

    /// Stores a new product and returns it with its assigned id.
    async fn insert_product(&self, product: NewProduct) -> Result<Product>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Fetches several products at once. Unknown ids are skipped.
    async fn get_products(&self, ids: &[ProductId]) -> Result<Vec<Product>>;

    /// Lists products matching the filter, newest first.
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>>;

    /// Applies a partial update. Returns `None` if the product doesn't exist.
    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Option<Product>>;

    /// Deletes a product. Fails with `ProductInUse` while order lines
    /// reference it. Returns false if it didn't exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool>;

    // -- Orders --

    /// Writes the order header and all its lines in one transaction.
    async fn insert_order(&self, order: NewOrder) -> Result<Order>;

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Looks up an order by the id the payment gateway assigned to it.
    async fn find_order_by_gateway_id(&self, razorpay_order_id: &str) -> Result<Option<Order>>;

    /// Lists orders matching the query, newest first.
    async fn list_orders(&self, query: &OrderQuery) -> Result<Vec<Order>>;

    /// Deletes an order and its lines. Returns false if it didn't exist.
    async fn delete_order(&self, id: OrderId) -> Result<bool>;

    /// Overwrites the order status. Returns `None` if the order doesn't exist.
    async fn update_order_status(&self, id: OrderId, status: OrderStatus)
    -> Result<Option<Order>>;

    /// Stores the gateway-side order id. Returns `None` if the order doesn't exist.
    async fn set_gateway_order_id(
        &self,
        id: OrderId,
        razorpay_order_id: &str,
    ) -> Result<Option<Order>>;

    /// Records a verified payment in one transaction: stores the payment id and
    /// signature, moves the order from PENDING to PROCESSING, and decrements
    /// each line's product stock by its quantity (no floor).
    ///
    /// Fails with `NotPending` if the order already left PENDING, so the
    /// transition and the stock decrement happen at most once.
    async fn record_payment(&self, id: OrderId, payment: &PaymentRecord) -> Result<Order>;

    // -- Aggregates --

    /// Groups every order by creation time and status.
    ///
    /// The default folds over [`list_orders`](Self::list_orders); backends
    /// that can group server-side should override it.
    async fn order_activity(&self, window: ActivityWindow) -> Result<OrderActivity> {
        let orders = self.list_orders(&OrderQuery::new()).await?;
        Ok(OrderActivity::from_orders(&orders, window))
    }

    /// The `limit` best-selling products across shipped and delivered orders.
    ///
    /// The default folds over [`list_orders`](Self::list_orders).
    async fn top_sellers(&self, limit: usize) -> Result<Vec<ProductSales>> {
        let orders = self.list_orders(&OrderQuery::new()).await?;
        let mut ids: Vec<ProductId> = orders
            .iter()
            .flat_map(|o| o.items.iter().map(|i| i.product_id))
            .collect();
        ids.sort_unstable();
        ids.dedup();
        let products = self.get_products(&ids).await?;
        Ok(rank_sales(&orders, &products, limit))
    }

    // -- Users --

    /// Stores a new user. Fails with `DuplicateUsername` if the name is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Fetches several users at once. Unknown ids are skipped.
    async fn get_users(&self, ids: &[UserId]) -> Result<Vec<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Lists all users ordered by id.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Applies a partial update. Returns `None` if the user doesn't exist.
    async fn update_user(&self, id: UserId, changes: UserChanges) -> Result<Option<User>>;

    /// Deletes a user together with their orders. Returns false if the user
    /// didn't exist.
    async fn delete_user(&self, id: UserId) -> Result<bool>;
}
