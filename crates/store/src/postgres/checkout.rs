//! Checkout transaction scope over Postgres.
//!
//! Row locks come from `SELECT ... FOR UPDATE` on the inventory primary
//! key `(product_id, seller_id)`; they are held until the transaction is
//! committed or rolled back, which is exactly the lifetime of
//! [`PgCheckoutTx`].

use async_trait::async_trait;
use sqlx::{Postgres, Row, Transaction};

use storekeep_checkout::{
    CheckoutStore, CheckoutTransaction, NewLineItem, StoreError,
};
use storekeep_core::{CustomerId, OrderId, ProductId, UserId};

use super::{decode_amount, encode_amount, map_sqlx_error, PgStore};

/// One open Postgres transaction running a placement.
pub struct PgCheckoutTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CheckoutStore for PgStore {
    type Tx = PgCheckoutTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin", e))?;
        Ok(PgCheckoutTx { tx })
    }
}

#[async_trait]
impl CheckoutTransaction for PgCheckoutTx {
    async fn lock_inventory(
        &mut self,
        product_id: ProductId,
        seller_id: UserId,
    ) -> Result<Option<u64>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT stock
            FROM inventory
            WHERE product_id = $1 AND seller_id = $2
            FOR UPDATE
            "#,
        )
        .bind(product_id.as_i64())
        .bind(seller_id.as_i64())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("lock_inventory", e))?;

        match row {
            Some(row) => {
                let stock: i64 = row
                    .try_get("stock")
                    .map_err(|e| map_sqlx_error("lock_inventory", e))?;
                Ok(Some(decode_amount("lock_inventory", stock)?))
            }
            None => Ok(None),
        }
    }

    async fn product_price(&mut self, product_id: ProductId) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT price FROM products WHERE id = $1")
            .bind(product_id.as_i64())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("product_price", e))?;

        // A locked inventory row references this product, so absence means
        // the store is corrupt, not that the caller asked for nonsense.
        let row = row.ok_or_else(|| {
            StoreError::Integrity(format!("product {product_id} has no catalog row"))
        })?;
        let price: i64 = row
            .try_get("price")
            .map_err(|e| map_sqlx_error("product_price", e))?;
        decode_amount("product_price", price)
    }

    async fn insert_order(
        &mut self,
        customer_id: CustomerId,
        total_amount: u64,
    ) -> Result<OrderId, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO orders (customer_id, total_amount)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(customer_id.as_i64())
        .bind(encode_amount("insert_order", total_amount)?)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| map_sqlx_error("insert_order", e))?;
        Ok(OrderId::new(id))
    }

    async fn insert_line_item(&mut self, line: &NewLineItem) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, product_id, seller_id, quantity, price)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(line.order_id.as_i64())
        .bind(line.product_id.as_i64())
        .bind(line.seller_id.as_i64())
        .bind(encode_amount("insert_line_item", line.quantity)?)
        .bind(encode_amount("insert_line_item", line.unit_price)?)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_line_item", e))?;
        Ok(())
    }

    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        seller_id: UserId,
        quantity: u64,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET stock = stock - $3, last_updated = NOW()
            WHERE product_id = $1 AND seller_id = $2
            "#,
        )
        .bind(product_id.as_i64())
        .bind(seller_id.as_i64())
        .bind(encode_amount("decrement_stock", quantity)?)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("decrement_stock", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Integrity(format!(
                "inventory row ({product_id}, {seller_id}) vanished mid-transaction"
            )));
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}
