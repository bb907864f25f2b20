//! Order service providing the customer and admin order operations.

use std::collections::HashMap;

use common::{OrderId, ProductId, UserId};
use store::{Order, OrderQuery, OrderStatus, Store, StoreError};

use crate::error::{DomainError, ValidationError};

use super::{OrderError, PlaceOrder, price_order};

/// Service for placing and managing orders.
///
/// Customer-facing reads and deletes are scoped to the caller: another
/// customer's order is reported as not found.
pub struct OrderService<S: Store> {
    store: S,
}

impl<S: Store> OrderService<S> {
    /// Creates a new order service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Places an order: validates stock, freezes current prices, adds
    /// shipping and writes the header and every line in one transaction.
    ///
    /// If any line fails, nothing is written. Stock is not decremented here;
    /// that happens when the payment is verified.
    #[tracing::instrument(skip(self, cmd), fields(customer_id = %cmd.customer_id, lines = cmd.lines.len()))]
    pub async fn place_order(&self, cmd: PlaceOrder) -> Result<Order, DomainError> {
        let mut ids: Vec<ProductId> = cmd.lines.iter().map(|l| l.product_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let products: HashMap<_, _> = self
            .store
            .get_products(&ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let new_order = match price_order(cmd.customer_id, &cmd.lines, &products) {
            Ok(order) => order,
            Err(err) => {
                tracing::info!(error = %err, "order rejected");
                metrics::counter!("orders_rejected_total").increment(1);
                return Err(err.into());
            }
        };

        let order = self
            .store
            .insert_order(new_order)
            .await
            .map_err(|e| match e {
                // Product deleted between the read and the write
                StoreError::ProductNotFound(id) => OrderError::ProductNotFound(id).into(),
                other => DomainError::Store(other),
            })?;

        tracing::info!(order_id = %order.id, total = %order.total_price, "order placed");
        metrics::counter!("orders_created_total").increment(1);
        Ok(order)
    }

    /// Returns the caller's own order.
    #[tracing::instrument(skip(self))]
    pub async fn get_order(&self, id: OrderId, customer_id: UserId) -> Result<Order, DomainError> {
        self.store
            .get_order(id)
            .await?
            .filter(|o| o.customer_id == customer_id)
            .ok_or_else(|| DomainError::not_found("Order", id))
    }

    /// Lists the caller's orders, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list_orders(&self, customer_id: UserId) -> Result<Vec<Order>, DomainError> {
        Ok(self
            .store
            .list_orders(&OrderQuery::for_customer(customer_id))
            .await?)
    }

    /// Deletes the caller's own order.
    #[tracing::instrument(skip(self))]
    pub async fn delete_order(&self, id: OrderId, customer_id: UserId) -> Result<(), DomainError> {
        let order = self.get_order(id, customer_id).await?;
        if !self.store.delete_order(order.id).await? {
            return Err(DomainError::not_found("Order", id));
        }
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }

    /// Lists every order, newest first (admin view).
    #[tracing::instrument(skip(self))]
    pub async fn list_all_orders(&self) -> Result<Vec<Order>, DomainError> {
        Ok(self.store.list_orders(&OrderQuery::new()).await?)
    }

    /// Sets an order's status (admin action). Any known status is accepted;
    /// a missing or unknown value is a validation error.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: OrderId,
        status: Option<&str>,
    ) -> Result<Order, DomainError> {
        let order = self
            .store
            .get_order(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", id))?;

        let status: OrderStatus = status
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| ValidationError::new("status", "Invalid status provided"))?;

        let updated = self
            .store
            .update_order_status(order.id, status)
            .await?
            .ok_or_else(|| DomainError::not_found("Order", id))?;

        tracing::info!(order_id = %id, from = %order.status, to = %status, "order status updated");
        Ok(updated)
    }
}
