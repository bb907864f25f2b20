//! Read-side aggregations for the admin dashboard.
//!
//! The report shapes are built from the store's grouped counts:
//! - [`DashboardStats`] for order volume, status mix and revenue
//! - [`ProductAnalytics`] for low-stock alerts and best sellers
//!
//! [`AnalyticsService`] asks a [`store::Store`] for the groups;
//! [`dashboard_stats`] and [`product_analytics`] compute the same reports
//! from orders already in memory.

pub mod dashboard;
pub mod products;
pub mod service;

pub use dashboard::{
    DAILY_WINDOW_DAYS, DailyCount, DashboardStats, HourlyCount, MonthlyCount, StatusCount,
    WeekdayCount, YearlyCount, activity_window, dashboard_stats,
};
pub use products::{
    DEFAULT_LOW_STOCK_THRESHOLD, LowStockAlert, ProductAnalytics, TOP_SELLING_LIMIT, TopSeller,
    product_analytics,
};
pub use service::AnalyticsService;
