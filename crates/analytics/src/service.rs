//! Runs the aggregations against a store.

use chrono::{DateTime, Utc};
use store::{ProductFilter, Store, StoreError};

use crate::dashboard::{DashboardStats, activity_window};
use crate::products::{ProductAnalytics, TOP_SELLING_LIMIT};

/// Admin analytics over a store's grouped counts.
pub struct AnalyticsService<S: Store> {
    store: S,
    low_stock_threshold: i64,
}

impl<S: Store> AnalyticsService<S> {
    pub fn new(store: S, low_stock_threshold: i64) -> Self {
        Self {
            store,
            low_stock_threshold,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn dashboard(&self, now: DateTime<Utc>) -> Result<DashboardStats, StoreError> {
        let activity = self.store.order_activity(activity_window(now)).await?;
        tracing::debug!(
            orders = activity.by_status.values().sum::<u64>(),
            "computing dashboard stats"
        );
        Ok(DashboardStats::from_activity(activity))
    }

    #[tracing::instrument(skip(self))]
    pub async fn products(&self) -> Result<ProductAnalytics, StoreError> {
        let low_stock = self
            .store
            .list_products(ProductFilter::new().stock_below(self.low_stock_threshold))
            .await?;
        let top_sellers = self.store.top_sellers(TOP_SELLING_LIMIT).await?;
        Ok(ProductAnalytics::new(
            &low_stock,
            top_sellers,
            self.low_stock_threshold,
        ))
    }
}
