//! Grouped order counts and sales totals for reporting.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate, Timelike};

use crate::{Money, Order, OrderStatus, Product, ProductId};

/// The UTC dates the daily and hourly breakdowns cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityWindow {
    /// Hourly counts cover orders placed on this date.
    pub today: NaiveDate,
    /// Daily counts cover orders placed on or after this date.
    pub since: NaiveDate,
}

/// Orders grouped by creation time (UTC) and status. Map keys ascend and
/// empty groups are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderActivity {
    /// Keyed by `(year, month)`.
    pub by_month: BTreeMap<(i32, u32), u64>,
    pub by_year: BTreeMap<i32, u64>,
    pub by_status: BTreeMap<OrderStatus, u64>,
    /// Only dates inside the window.
    pub by_date: BTreeMap<NaiveDate, u64>,
    /// Orders placed on `today`, by hour of day.
    pub by_hour: [u64; 24],
    /// 1 = Sunday through 7 = Saturday.
    pub by_weekday: BTreeMap<u32, u64>,
    /// Sum of totals over delivered orders.
    pub delivered_revenue: Money,
}

impl OrderActivity {
    /// Folds orders into their groups.
    pub fn from_orders<'a>(
        orders: impl IntoIterator<Item = &'a Order>,
        window: ActivityWindow,
    ) -> Self {
        let mut activity = Self::default();

        for order in orders {
            let at = order.created_at;
            let date = at.date_naive();

            *activity.by_month.entry((at.year(), at.month())).or_default() += 1;
            *activity.by_year.entry(at.year()).or_default() += 1;
            *activity.by_status.entry(order.status).or_default() += 1;
            *activity
                .by_weekday
                .entry(at.weekday().number_from_sunday())
                .or_default() += 1;

            if date >= window.since {
                *activity.by_date.entry(date).or_default() += 1;
            }
            if date == window.today {
                activity.by_hour[at.hour() as usize] += 1;
            }
            if order.status == OrderStatus::Delivered {
                activity.delivered_revenue += order.total_price;
            }
        }

        activity
    }
}

/// Units of one product sold across shipped and delivered orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductSales {
    pub product_id: ProductId,
    pub name: String,
    pub units: u64,
}

/// Ranks products by units sold, highest first, keeping at most `limit`.
/// Equal totals go to the lower product id. Names come from `products`.
pub fn rank_sales(orders: &[Order], products: &[Product], limit: usize) -> Vec<ProductSales> {
    let mut sold: HashMap<ProductId, u64> = HashMap::new();
    for order in orders.iter().filter(|o| o.status.counts_as_sold()) {
        for item in &order.items {
            *sold.entry(item.product_id).or_default() += u64::from(item.quantity);
        }
    }

    let names: HashMap<ProductId, &str> = products.iter().map(|p| (p.id, p.name.as_str())).collect();
    let mut ranked: Vec<(ProductId, u64)> = sold.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .take(limit)
        .map(|(product_id, units)| ProductSales {
            product_id,
            name: names.get(&product_id).map(|n| n.to_string()).unwrap_or_default(),
            units,
        })
        .collect()
}
