//! Customers, catalog, inventory receipts, and historical sales imports.
//!
//! Bulk operations run inside a single transaction each: an upload either
//! lands completely or not at all.

use std::collections::HashMap;

use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction};
use tracing::instrument;

use storekeep_catalog::{NewProduct, Product, ProductListing};
use storekeep_checkout::StoreError;
use storekeep_core::{CategoryId, CustomerId, ProductId, UserId};
use storekeep_customers::{Customer, NewCustomer};
use storekeep_ingestion::HistoricalOrder;
use storekeep_inventory::StockReceipt;

use super::{decode_amount, encode_amount, map_sqlx_error, PgStore};

fn customer_from_row(row: &PgRow) -> Result<Customer, StoreError> {
    let get = |e| map_sqlx_error("customer_from_row", e);
    Ok(Customer {
        id: CustomerId::new(row.try_get("id").map_err(get)?),
        unique_id: row.try_get("unique_id").map_err(get)?,
        name: row.try_get("name").map_err(get)?,
        phone: row.try_get("phone").map_err(get)?,
        email: row.try_get("email").map_err(get)?,
        zip_code: row.try_get("zip_code").map_err(get)?,
        city: row.try_get("city").map_err(get)?,
        state: row.try_get("state").map_err(get)?,
    })
}

const CUSTOMER_COLUMNS: &str = "id, unique_id, name, phone, email, zip_code, city, state";

impl PgStore {
    pub async fn create_customer(&self, new: &NewCustomer) -> Result<Customer, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO customers (unique_id, name, phone, email, zip_code, city, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, unique_id, name, phone, email, zip_code, city, state
            "#,
        )
        .bind(&new.unique_id)
        .bind(&new.name)
        .bind(&new.phone)
        .bind(&new.email)
        .bind(&new.zip_code)
        .bind(&new.city)
        .bind(&new.state)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("create_customer", e))?;
        customer_from_row(&row)
    }

    /// Insert an upload's worth of customers in one transaction.
    #[instrument(skip(self, batch), fields(rows = batch.len()), err)]
    pub async fn import_customers(&self, batch: &[NewCustomer]) -> Result<usize, StoreError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("import_customers", e))?;

        for new in batch {
            sqlx::query(
                r#"
                INSERT INTO customers (unique_id, name, phone, email, zip_code, city, state)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(&new.unique_id)
            .bind(&new.name)
            .bind(&new.phone)
            .bind(&new.email)
            .bind(&new.zip_code)
            .bind(&new.city)
            .bind(&new.state)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("import_customers", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("import_customers", e))?;
        Ok(batch.len())
    }

    pub async fn list_customers(&self, limit: i64) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("list_customers", e))?;
        rows.iter().map(customer_from_row).collect()
    }

    /// Substring search over name, e-mail and phone.
    pub async fn search_customers(
        &self,
        query: &str,
        limit: i64,
    ) -> Result<Vec<Customer>, StoreError> {
        let pattern = format!("%{query}%");
        let rows = sqlx::query(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE name ILIKE $1 OR email ILIKE $1 OR phone ILIKE $1
            ORDER BY name
            LIMIT $2
            "#
        ))
        .bind(&pattern)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("search_customers", e))?;
        rows.iter().map(customer_from_row).collect()
    }

    pub async fn create_product(&self, new: &NewProduct) -> Result<Product, StoreError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("create_product", e))?;
        let product = insert_product(&mut tx, new, &mut HashMap::new()).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("create_product", e))?;
        Ok(product)
    }

    /// Insert an upload's worth of products in one transaction, resolving
    /// (or creating) each row's category by name.
    #[instrument(skip(self, batch), fields(rows = batch.len()), err)]
    pub async fn import_products(&self, batch: &[NewProduct]) -> Result<usize, StoreError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("import_products", e))?;

        let mut category_cache = HashMap::new();
        for new in batch {
            insert_product(&mut tx, new, &mut category_cache).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("import_products", e))?;
        Ok(batch.len())
    }

    /// Seller-facing product listing: catalog joined with the requesting
    /// seller's stock (zero when the seller holds none).
    pub async fn products_for_seller(
        &self,
        seller_id: UserId,
        query: &str,
        limit: i64,
    ) -> Result<Vec<ProductListing>, StoreError> {
        let pattern = format!("%{query}%");
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.price, p.expiry_date, c.name AS category_name,
                   COALESCE(i.stock, 0) AS stock
            FROM products p
            JOIN categories c ON c.id = p.category_id
            LEFT JOIN inventory i ON i.product_id = p.id AND i.seller_id = $1
            WHERE p.name ILIKE $2
            ORDER BY p.name
            LIMIT $3
            "#,
        )
        .bind(seller_id.as_i64())
        .bind(&pattern)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(|e| map_sqlx_error("products_for_seller", e))?;

        let get = |e| map_sqlx_error("products_for_seller", e);
        rows.iter()
            .map(|row| {
                Ok(ProductListing {
                    id: ProductId::new(row.try_get("id").map_err(get)?),
                    name: row.try_get("name").map_err(get)?,
                    price: decode_amount(
                        "products_for_seller",
                        row.try_get("price").map_err(get)?,
                    )?,
                    expiry_date: row.try_get("expiry_date").map_err(get)?,
                    category_name: row.try_get("category_name").map_err(get)?,
                    stock: decode_amount(
                        "products_for_seller",
                        row.try_get("stock").map_err(get)?,
                    )?,
                })
            })
            .collect()
    }

    /// Add received stock for a seller, one transaction per upload.
    /// Existing rows accumulate (`stock + delta`), new pairs are created.
    #[instrument(skip(self, batch), fields(seller = %seller_id, rows = batch.len()), err)]
    pub async fn receive_stock(
        &self,
        seller_id: UserId,
        batch: &[StockReceipt],
    ) -> Result<usize, StoreError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("receive_stock", e))?;

        for receipt in batch {
            sqlx::query(
                r#"
                INSERT INTO inventory (product_id, seller_id, stock)
                VALUES ($1, $2, $3)
                ON CONFLICT (product_id, seller_id)
                DO UPDATE SET
                    stock = inventory.stock + EXCLUDED.stock,
                    last_updated = NOW()
                "#,
            )
            .bind(receipt.product_id.as_i64())
            .bind(seller_id.as_i64())
            .bind(encode_amount("receive_stock", receipt.quantity)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("receive_stock", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("receive_stock", e))?;
        Ok(batch.len())
    }

    /// Import backfilled orders in one transaction. Prices fall back to the
    /// canonical product price; decrements clamp at zero since historical
    /// rows are not availability-checked.
    #[instrument(skip(self, orders), fields(seller = %seller_id, orders = orders.len()), err)]
    pub async fn import_sales(
        &self,
        seller_id: UserId,
        orders: &[HistoricalOrder],
    ) -> Result<usize, StoreError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("import_sales", e))?;

        for order in orders {
            import_one_order(&mut tx, seller_id, order).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("import_sales", e))?;
        Ok(orders.len())
    }
}

/// Resolve a category by name, creating it on first sight. The cache keeps
/// one upload from re-querying the same name per row.
async fn resolve_category(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    cache: &mut HashMap<String, CategoryId>,
) -> Result<CategoryId, StoreError> {
    if let Some(&id) = cache.get(name) {
        return Ok(id);
    }

    let row = sqlx::query(
        r#"
        INSERT INTO categories (name)
        VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("resolve_category", e))?;

    let id = CategoryId::new(
        row.try_get("id")
            .map_err(|e| map_sqlx_error("resolve_category", e))?,
    );
    cache.insert(name.to_string(), id);
    Ok(id)
}

async fn insert_product(
    tx: &mut Transaction<'_, Postgres>,
    new: &NewProduct,
    category_cache: &mut HashMap<String, CategoryId>,
) -> Result<Product, StoreError> {
    let category_id = resolve_category(tx, &new.category, category_cache).await?;

    let row = sqlx::query(
        r#"
        INSERT INTO products (name, category_id, price, expiry_date)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(&new.name)
    .bind(category_id.as_i64())
    .bind(encode_amount("insert_product", new.price)?)
    .bind(new.expiry_date)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_product", e))?;

    Ok(Product {
        id: ProductId::new(
            row.try_get("id")
                .map_err(|e| map_sqlx_error("insert_product", e))?,
        ),
        name: new.name.clone(),
        price: new.price,
        expiry_date: new.expiry_date,
        category_id,
    })
}

async fn import_one_order(
    tx: &mut Transaction<'_, Postgres>,
    seller_id: UserId,
    order: &HistoricalOrder,
) -> Result<(), StoreError> {
    // Price every line first so the order header can carry the total.
    let mut priced = Vec::with_capacity(order.lines.len());
    let mut total: u64 = 0;
    for line in &order.lines {
        let unit_price = match line.price_override {
            Some(price) => price,
            None => canonical_price(tx, line.product_id).await?,
        };
        total = total.saturating_add(unit_price.saturating_mul(line.quantity));
        priced.push((line, unit_price));
    }

    let row = sqlx::query(
        "INSERT INTO orders (customer_id, total_amount) VALUES ($1, $2) RETURNING id",
    )
    .bind(order.customer_id.as_i64())
    .bind(encode_amount("import_sales", total)?)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("import_sales", e))?;
    let order_id: i64 = row
        .try_get("id")
        .map_err(|e| map_sqlx_error("import_sales", e))?;

    for (line, unit_price) in priced {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, seller_id, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order_id)
        .bind(line.product_id.as_i64())
        .bind(seller_id.as_i64())
        .bind(encode_amount("import_sales", line.quantity)?)
        .bind(encode_amount("import_sales", unit_price)?)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("import_sales", e))?;

        // Historical rows are not availability-checked; the clamp keeps the
        // stock >= 0 invariant intact.
        sqlx::query(
            r#"
            UPDATE inventory
            SET stock = GREATEST(stock - $3, 0), last_updated = NOW()
            WHERE product_id = $1 AND seller_id = $2
            "#,
        )
        .bind(line.product_id.as_i64())
        .bind(seller_id.as_i64())
        .bind(encode_amount("import_sales", line.quantity)?)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("import_sales", e))?;
    }

    Ok(())
}

async fn canonical_price(
    tx: &mut Transaction<'_, Postgres>,
    product_id: ProductId,
) -> Result<u64, StoreError> {
    let row = sqlx::query("SELECT price FROM products WHERE id = $1")
        .bind(product_id.as_i64())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("canonical_price", e))?;
    let row = row.ok_or_else(|| {
        StoreError::Integrity(format!("product {product_id} has no catalog row"))
    })?;
    let price: i64 = row
        .try_get("price")
        .map_err(|e| map_sqlx_error("canonical_price", e))?;
    decode_amount("canonical_price", price)
}
