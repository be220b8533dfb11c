//! Dashboard read models.

use chrono::NaiveDate;
use serde::Serialize;

/// Items with `0 < stock < threshold` count as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 10;

/// Products expiring within this many days count as near-expiry.
pub const EXPIRY_WINDOW_DAYS: i64 = 30;

/// How far back the daily sales series reaches, in days.
pub const SALES_WINDOW_DAYS: i64 = 30;

/// How far back the revenue trend reaches, in days.
pub const REVENUE_TREND_DAYS: i64 = 90;

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardKpis {
    /// All-time revenue in the smallest currency unit.
    pub total_revenue: u64,
    pub total_orders: u64,
    /// Customers with at least one order.
    pub active_customers: u64,
    pub low_stock_items: u64,
    /// Products expired or expiring soon that still have (or never had) stock.
    pub expiring_products: u64,
}

/// Revenue attributed to one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRevenue {
    pub name: String,
    pub revenue: u64,
}

/// One day of order activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub amount: u64,
    pub orders: u64,
}

/// One day of the revenue trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevenuePoint {
    pub date: NaiveDate,
    pub revenue: u64,
}

/// Everything the dashboard endpoint returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub kpis: DashboardKpis,
    pub popular_categories: Vec<CategoryRevenue>,
    pub sales_by_day: Vec<DailySales>,
    pub revenue_trend: Vec<RevenuePoint>,
}
