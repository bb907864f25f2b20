//! Order volume, status mix and revenue.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use common::Money;
use serde::Serialize;
use store::{ActivityWindow, Order, OrderActivity, OrderStatus};

/// How far back the daily trend reaches.
pub const DAILY_WINDOW_DAYS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyCount {
    /// First instant of the month.
    pub month: DateTime<Utc>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearlyCount {
    /// First instant of the year.
    pub year: DateTime<Utc>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlyCount {
    /// `"HH:00"`.
    pub hour: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayCount {
    /// 1 = Sunday through 7 = Saturday.
    pub day_of_week_num: u32,
    pub count: u64,
}

/// Everything the dashboard's charts and KPI tiles need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub monthly_orders: Vec<MonthlyCount>,
    pub yearly_orders: Vec<YearlyCount>,
    pub status_distribution: Vec<StatusCount>,
    /// Sum of totals over delivered orders.
    pub total_revenue: Money,
    pub daily_orders: Vec<DailyCount>,
    /// Always 24 entries, hours with no orders included.
    pub hourly_orders_today: Vec<HourlyCount>,
    pub orders_by_day_of_week: Vec<WeekdayCount>,
}

/// The daily window and "today" as seen at `now`, in UTC.
pub fn activity_window(now: DateTime<Utc>) -> ActivityWindow {
    let today = now.date_naive();
    ActivityWindow {
        today,
        since: today
            .checked_sub_days(Days::new(DAILY_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MIN),
    }
}

impl DashboardStats {
    /// Shapes grouped order counts for the dashboard.
    pub fn from_activity(activity: OrderActivity) -> Self {
        Self {
            monthly_orders: activity
                .by_month
                .into_iter()
                .filter_map(|((year, month), count)| {
                    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
                        .single()
                        .map(|month| MonthlyCount { month, count })
                })
                .collect(),
            yearly_orders: activity
                .by_year
                .into_iter()
                .filter_map(|(year, count)| {
                    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
                        .single()
                        .map(|year| YearlyCount { year, count })
                })
                .collect(),
            // BTreeMap over OrderStatus iterates in lifecycle order
            status_distribution: activity
                .by_status
                .into_iter()
                .map(|(status, count)| StatusCount { status, count })
                .collect(),
            total_revenue: activity.delivered_revenue,
            daily_orders: activity
                .by_date
                .into_iter()
                .map(|(date, count)| DailyCount { date, count })
                .collect(),
            hourly_orders_today: activity
                .by_hour
                .iter()
                .enumerate()
                .map(|(hour, &count)| HourlyCount {
                    hour: format!("{hour:02}:00"),
                    count,
                })
                .collect(),
            orders_by_day_of_week: activity
                .by_weekday
                .into_iter()
                .map(|(day_of_week_num, count)| WeekdayCount {
                    day_of_week_num,
                    count,
                })
                .collect(),
        }
    }
}

/// Computes dashboard statistics for `orders` as seen at `now`.
///
/// All bucketing happens in UTC. "Today" is the UTC date of `now`.
pub fn dashboard_stats(orders: &[Order], now: DateTime<Utc>) -> DashboardStats {
    DashboardStats::from_activity(OrderActivity::from_orders(orders, activity_window(now)))
}
