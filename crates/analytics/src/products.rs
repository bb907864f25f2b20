//! Stock alerts and best sellers.

use common::ProductId;
use serde::Serialize;
use store::{Order, Product, ProductSales, rank_sales};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;
pub const TOP_SELLING_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockAlert {
    pub id: ProductId,
    pub name: String,
    pub current_stock: i64,
    pub threshold: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopSeller {
    pub id: ProductId,
    pub name: String,
    pub total_sold: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductAnalytics {
    pub low_stock_alerts: Vec<LowStockAlert>,
    pub top_selling_products: Vec<TopSeller>,
    pub low_stock_count: usize,
}

impl ProductAnalytics {
    /// Alerts for the products under `threshold` (lowest stock first) next
    /// to the ranked best sellers.
    pub fn new(products: &[Product], top_sellers: Vec<ProductSales>, threshold: i64) -> Self {
        let mut low: Vec<&Product> = products.iter().filter(|p| p.stock < threshold).collect();
        low.sort_by_key(|p| (p.stock, p.id));

        let low_stock_alerts: Vec<LowStockAlert> = low
            .into_iter()
            .map(|p| LowStockAlert {
                id: p.id,
                name: p.name.clone(),
                current_stock: p.stock,
                threshold,
            })
            .collect();

        Self {
            low_stock_count: low_stock_alerts.len(),
            low_stock_alerts,
            top_selling_products: top_sellers
                .into_iter()
                .map(|sales| TopSeller {
                    id: sales.product_id,
                    name: sales.name,
                    total_sold: sales.units,
                })
                .collect(),
        }
    }
}

/// Products under `threshold` (lowest stock first) and the best sellers
/// across shipped and delivered orders.
pub fn product_analytics(products: &[Product], orders: &[Order], threshold: i64) -> ProductAnalytics {
    let top_sellers = rank_sales(orders, products, TOP_SELLING_LIMIT);
    ProductAnalytics::new(products, top_sellers, threshold)
}
