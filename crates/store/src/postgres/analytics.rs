//! Dashboard aggregation queries.

use sqlx::Row;
use tracing::instrument;

use storekeep_checkout::StoreError;

use crate::analytics::{
    CategoryRevenue, DailySales, Dashboard, DashboardKpis, RevenuePoint, EXPIRY_WINDOW_DAYS,
    LOW_STOCK_THRESHOLD, REVENUE_TREND_DAYS, SALES_WINDOW_DAYS,
};

use super::{decode_amount, map_sqlx_error, PgStore};

impl PgStore {
    /// Build the whole dashboard payload in one pass.
    #[instrument(skip(self), err)]
    pub async fn dashboard(&self) -> Result<Dashboard, StoreError> {
        Ok(Dashboard {
            kpis: self.kpis().await?,
            popular_categories: self.popular_categories().await?,
            sales_by_day: self.sales_by_day().await?,
            revenue_trend: self.revenue_trend().await?,
        })
    }

    async fn kpis(&self) -> Result<DashboardKpis, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COALESCE(SUM(total_amount), 0)::BIGINT FROM orders) AS total_revenue,
                (SELECT COUNT(*) FROM orders) AS total_orders,
                (SELECT COUNT(DISTINCT customer_id) FROM orders) AS active_customers,
                (SELECT COUNT(*) FROM inventory
                   WHERE stock > 0 AND stock < $1) AS low_stock_items,
                (SELECT COUNT(DISTINCT p.id) FROM products p
                   LEFT JOIN inventory i ON i.product_id = p.id
                   WHERE p.expiry_date IS NOT NULL
                     AND p.expiry_date <= CURRENT_DATE + $2 * INTERVAL '1 day'
                     AND (i.stock IS NULL OR i.stock > 0)) AS expiring_products
            "#,
        )
        .bind(LOW_STOCK_THRESHOLD)
        .bind(EXPIRY_WINDOW_DAYS as f64)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("dashboard_kpis", e))?;

        let get = |e| map_sqlx_error("dashboard_kpis", e);
        Ok(DashboardKpis {
            total_revenue: decode_amount(
                "dashboard_kpis",
                row.try_get::<i64, _>("total_revenue").map_err(get)?,
            )?,
            total_orders: decode_amount(
                "dashboard_kpis",
                row.try_get::<i64, _>("total_orders").map_err(get)?,
            )?,
            active_customers: decode_amount(
                "dashboard_kpis",
                row.try_get::<i64, _>("active_customers").map_err(get)?,
            )?,
            low_stock_items: decode_amount(
                "dashboard_kpis",
                row.try_get::<i64, _>("low_stock_items").map_err(get)?,
            )?,
            expiring_products: decode_amount(
                "dashboard_kpis",
                row.try_get::<i64, _>("expiring_products").map_err(get)?,
            )?,
        })
    }

    async fn popular_categories(&self) -> Result<Vec<CategoryRevenue>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT c.name, COALESCE(SUM(oi.quantity * oi.price), 0)::BIGINT AS revenue
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id
            LEFT JOIN order_items oi ON oi.product_id = p.id
            GROUP BY c.id, c.name
            ORDER BY revenue DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("popular_categories", e))?;

        let get = |e| map_sqlx_error("popular_categories", e);
        rows.iter()
            .map(|row| {
                Ok(CategoryRevenue {
                    name: row.try_get("name").map_err(get)?,
                    revenue: decode_amount(
                        "popular_categories",
                        row.try_get::<i64, _>("revenue").map_err(get)?,
                    )?,
                })
            })
            .collect()
    }

    async fn sales_by_day(&self) -> Result<Vec<DailySales>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT (o.created_at AT TIME ZONE 'UTC')::date AS date,
                   SUM(o.total_amount)::BIGINT AS amount,
                   COUNT(o.id) AS orders
            FROM orders o
            WHERE o.created_at >= NOW() - $1 * INTERVAL '1 day'
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(SALES_WINDOW_DAYS as f64)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("sales_by_day", e))?;

        let get = |e| map_sqlx_error("sales_by_day", e);
        rows.iter()
            .map(|row| {
                Ok(DailySales {
                    date: row.try_get("date").map_err(get)?,
                    amount: decode_amount(
                        "sales_by_day",
                        row.try_get::<i64, _>("amount").map_err(get)?,
                    )?,
                    orders: decode_amount(
                        "sales_by_day",
                        row.try_get::<i64, _>("orders").map_err(get)?,
                    )?,
                })
            })
            .collect()
    }

    async fn revenue_trend(&self) -> Result<Vec<RevenuePoint>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT (o.created_at AT TIME ZONE 'UTC')::date AS date,
                   SUM(o.total_amount)::BIGINT AS revenue
            FROM orders o
            WHERE o.created_at >= NOW() - $1 * INTERVAL '1 day'
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(REVENUE_TREND_DAYS as f64)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("revenue_trend", e))?;

        let get = |e| map_sqlx_error("revenue_trend", e);
        rows.iter()
            .map(|row| {
                Ok(RevenuePoint {
                    date: row.try_get("date").map_err(get)?,
                    revenue: decode_amount(
                        "revenue_trend",
                        row.try_get::<i64, _>("revenue").map_err(get)?,
                    )?,
                })
            })
            .collect()
    }
}
