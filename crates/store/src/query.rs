use crate::{OrderStatus, UserId};

/// Catalog listing filter. Each flag, when set, keeps only products that
/// have it enabled; unset flags don't filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub featured: bool,
    pub trending: bool,
    pub bestseller: bool,
    /// Keep only products with `stock` strictly below this value.
    pub stock_below: Option<i64>,
}

impl ProductFilter {
    /// Matches every product.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn featured(mut self) -> Self {
        self.featured = true;
        self
    }

    pub fn trending(mut self) -> Self {
        self.trending = true;
        self
    }

    pub fn bestseller(mut self) -> Self {
        self.bestseller = true;
        self
    }

    pub fn stock_below(mut self, threshold: i64) -> Self {
        self.stock_below = Some(threshold);
        self
    }

    /// Returns true if the given product passes the filter.
    pub fn matches(&self, product: &crate::Product) -> bool {
        if self.featured && !product.is_featured {
            return false;
        }
        if self.trending && !product.is_trending {
            return false;
        }
        if self.bestseller && !product.is_bestseller {
            return false;
        }
        if let Some(threshold) = self.stock_below
            && product.stock >= threshold
        {
            return false;
        }
        true
    }
}

/// Builder for order listings. Results are always newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Restrict to one customer's orders.
    pub customer_id: Option<UserId>,

    /// Restrict to orders in any of these statuses.
    pub statuses: Option<Vec<OrderStatus>>,
}

impl OrderQuery {
    /// Matches every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for one customer's orders.
    pub fn for_customer(customer_id: UserId) -> Self {
        Self {
            customer_id: Some(customer_id),
            ..Default::default()
        }
    }

    pub fn statuses(mut self, statuses: Vec<OrderStatus>) -> Self {
        self.statuses = Some(statuses);
        self
    }

    /// Returns true if the given order passes the query.
    pub fn matches(&self, order: &crate::Order) -> bool {
        if let Some(customer_id) = self.customer_id
            && order.customer_id != customer_id
        {
            return false;
        }
        if let Some(ref statuses) = self.statuses
            && !statuses.contains(&order.status)
        {
            return false;
        }
        true
    }
}
