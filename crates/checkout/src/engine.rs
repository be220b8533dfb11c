//! The order placement engine.
//!
//! One linear, atomic unit of work: validate, lock and check stock per
//! item, price the lines, persist the order with its line items, decrement
//! stock, commit. Any failure on any path rolls the whole transaction
//! back; no partial order and no partial stock decrement is ever
//! observable.

use std::collections::HashMap;

use storekeep_core::ProductId;

use crate::error::CheckoutError;
use crate::order::{NewLineItem, OrderConfirmation, PlaceOrder};
use crate::store::{CheckoutStore, CheckoutTransaction};

/// Place an order for `request.customer_id`, fulfilled by
/// `request.seller_id`, atomically against `store`.
///
/// Serialization across concurrent placements is delegated entirely to the
/// store's per-`(product, seller)` row locks; the engine holds no shared
/// state. Items are processed in request order and duplicate products are
/// checked sequentially against the remaining locked stock, so error
/// attribution is deterministic.
pub async fn place_order<S>(
    store: &S,
    request: &PlaceOrder,
) -> Result<OrderConfirmation, CheckoutError>
where
    S: CheckoutStore,
{
    validate(request)?;

    let mut tx = store.begin().await?;
    match fill_order(&mut tx, request).await {
        Ok(confirmation) => {
            tx.commit().await?;
            Ok(confirmation)
        }
        Err(err) => {
            // The original failure outranks a rollback failure; dropping a
            // broken transaction still releases its locks.
            let _ = tx.rollback().await;
            Err(err)
        }
    }
}

/// Fast request checks; no store interaction happens before these pass.
fn validate(request: &PlaceOrder) -> Result<(), CheckoutError> {
    if request.items.is_empty() {
        return Err(CheckoutError::EmptyOrder);
    }
    for item in &request.items {
        if item.quantity == 0 {
            return Err(CheckoutError::NonPositiveQuantity {
                product_id: item.product_id,
            });
        }
    }
    Ok(())
}

async fn fill_order<T>(
    tx: &mut T,
    request: &PlaceOrder,
) -> Result<OrderConfirmation, CheckoutError>
where
    T: CheckoutTransaction,
{
    let mut total_amount: u64 = 0;
    // Quantities already claimed by earlier entries of this request, so a
    // repeated product is checked against what its lock still has left.
    let mut reserved: HashMap<ProductId, u64> = HashMap::new();
    let mut lines = Vec::with_capacity(request.items.len());

    for item in &request.items {
        let stock = tx
            .lock_inventory(item.product_id, request.seller_id)
            .await?;
        let claimed = reserved.get(&item.product_id).copied().unwrap_or(0);
        let available = stock.map(|s| s.saturating_sub(claimed)).unwrap_or(0);
        if stock.is_none() || available < item.quantity {
            return Err(CheckoutError::InsufficientStock {
                product_id: item.product_id,
            });
        }

        let unit_price = tx.product_price(item.product_id).await?;
        let line_total = unit_price
            .checked_mul(item.quantity)
            .ok_or(CheckoutError::TotalOverflow {
                product_id: item.product_id,
            })?;
        total_amount = total_amount
            .checked_add(line_total)
            .ok_or(CheckoutError::TotalOverflow {
                product_id: item.product_id,
            })?;

        *reserved.entry(item.product_id).or_insert(0) += item.quantity;
        lines.push((item.product_id, item.quantity, unit_price));
    }

    let order_id = tx.insert_order(request.customer_id, total_amount).await?;

    for (product_id, quantity, unit_price) in lines {
        tx.insert_line_item(&NewLineItem {
            order_id,
            product_id,
            seller_id: request.seller_id,
            quantity,
            unit_price,
        })
        .await?;
        // Same locked row as the availability check above; no re-read race.
        tx.decrement_stock(product_id, request.seller_id, quantity)
            .await?;
    }

    Ok(OrderConfirmation {
        order_id,
        total_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use storekeep_core::{CustomerId, OrderId, UserId};

    use crate::order::OrderItemRequest;
    use crate::store::StoreError;

    /// Scripted single-transaction store: committed stock/prices are fixed
    /// for the duration of one placement, and every store call is recorded
    /// so the tests can assert on call order and rollback behavior.
    #[derive(Default)]
    struct ScriptedStore {
        stock: HashMap<(ProductId, UserId), u64>,
        prices: HashMap<ProductId, u64>,
        fail_on_insert_order: bool,
        begun: AtomicUsize,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedStore {
        fn with_stock(entries: &[(i64, i64, u64, u64)]) -> Self {
            // (product, seller, stock, price)
            let mut store = Self::default();
            for &(product, seller, stock, price) in entries {
                store
                    .stock
                    .insert((ProductId::new(product), UserId::new(seller)), stock);
                store.prices.insert(ProductId::new(product), price);
            }
            store
        }

        fn log_lines(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    struct ScriptedTx {
        stock: HashMap<(ProductId, UserId), u64>,
        prices: HashMap<ProductId, u64>,
        fail_on_insert_order: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedTx {
        fn push(&self, entry: impl Into<String>) {
            self.log.lock().unwrap().push(entry.into());
        }
    }

    #[async_trait]
    impl CheckoutStore for ScriptedStore {
        type Tx = ScriptedTx;

        async fn begin(&self) -> Result<Self::Tx, StoreError> {
            self.begun.fetch_add(1, Ordering::SeqCst);
            Ok(ScriptedTx {
                stock: self.stock.clone(),
                prices: self.prices.clone(),
                fail_on_insert_order: self.fail_on_insert_order,
                log: Arc::clone(&self.log),
            })
        }
    }

    #[async_trait]
    impl CheckoutTransaction for ScriptedTx {
        async fn lock_inventory(
            &mut self,
            product_id: ProductId,
            seller_id: UserId,
        ) -> Result<Option<u64>, StoreError> {
            self.push(format!("lock {product_id}"));
            Ok(self.stock.get(&(product_id, seller_id)).copied())
        }

        async fn product_price(&mut self, product_id: ProductId) -> Result<u64, StoreError> {
            self.prices
                .get(&product_id)
                .copied()
                .ok_or_else(|| StoreError::Integrity(format!("no product {product_id}")))
        }

        async fn insert_order(
            &mut self,
            _customer_id: CustomerId,
            total_amount: u64,
        ) -> Result<OrderId, StoreError> {
            if self.fail_on_insert_order {
                return Err(StoreError::Unavailable("connection lost".into()));
            }
            self.push(format!("insert_order total={total_amount}"));
            Ok(OrderId::new(1))
        }

        async fn insert_line_item(&mut self, line: &NewLineItem) -> Result<(), StoreError> {
            self.push(format!(
                "insert_line product={} qty={} price={}",
                line.product_id, line.quantity, line.unit_price
            ));
            Ok(())
        }

        async fn decrement_stock(
            &mut self,
            product_id: ProductId,
            _seller_id: UserId,
            quantity: u64,
        ) -> Result<(), StoreError> {
            self.push(format!("decrement product={product_id} qty={quantity}"));
            Ok(())
        }

        async fn commit(self) -> Result<(), StoreError> {
            self.push("commit");
            Ok(())
        }

        async fn rollback(self) -> Result<(), StoreError> {
            self.push("rollback");
            Ok(())
        }
    }

    fn request(items: &[(i64, u64)]) -> PlaceOrder {
        PlaceOrder {
            customer_id: CustomerId::new(3),
            seller_id: UserId::new(9),
            items: items
                .iter()
                .map(|&(product, quantity)| OrderItemRequest {
                    product_id: ProductId::new(product),
                    quantity,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn successful_placement_prices_persists_and_commits() {
        let store = ScriptedStore::with_stock(&[(1, 9, 5, 100)]);

        let confirmation = place_order(&store, &request(&[(1, 5)])).await.unwrap();
        assert_eq!(confirmation.total_amount, 500);

        let log = store.log_lines();
        assert_eq!(
            log,
            vec![
                "lock 1",
                "insert_order total=500",
                "insert_line product=1 qty=5 price=100",
                "decrement product=1 qty=5",
                "commit",
            ]
        );
    }

    #[tokio::test]
    async fn empty_order_is_rejected_without_a_transaction() {
        let store = ScriptedStore::with_stock(&[(1, 9, 5, 100)]);

        let err = place_order(&store, &request(&[])).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyOrder));
        assert_eq!(store.begun.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected_without_a_transaction() {
        let store = ScriptedStore::with_stock(&[(1, 9, 5, 100)]);

        let err = place_order(&store, &request(&[(1, 0)])).await.unwrap_err();
        match err {
            CheckoutError::NonPositiveQuantity { product_id } => {
                assert_eq!(product_id, ProductId::new(1));
            }
            other => panic!("expected NonPositiveQuantity, got {other:?}"),
        }
        assert_eq!(store.begun.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn insufficient_stock_names_the_product_and_rolls_back() {
        let store = ScriptedStore::with_stock(&[(1, 9, 5, 100), (2, 9, 1, 50)]);

        let err = place_order(&store, &request(&[(1, 2), (2, 4)]))
            .await
            .unwrap_err();
        match err {
            CheckoutError::InsufficientStock { product_id } => {
                assert_eq!(product_id, ProductId::new(2));
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        let log = store.log_lines();
        assert_eq!(log.last().map(String::as_str), Some("rollback"));
        assert!(!log.iter().any(|l| l.starts_with("insert_order")));
        assert!(!log.iter().any(|l| l.starts_with("decrement")));
    }

    #[tokio::test]
    async fn missing_inventory_record_reads_as_insufficient_stock() {
        let store = ScriptedStore::with_stock(&[(1, 9, 5, 100)]);

        let err = place_order(&store, &request(&[(7, 1)])).await.unwrap_err();
        match err {
            CheckoutError::InsufficientStock { product_id } => {
                assert_eq!(product_id, ProductId::new(7));
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn repeated_product_is_checked_against_remaining_stock() {
        // Two entries of 3 against stock 5: the second sees 2 left and the
        // whole call fails.
        let store = ScriptedStore::with_stock(&[(1, 9, 5, 100)]);

        let err = place_order(&store, &request(&[(1, 3), (1, 3)]))
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
        assert_eq!(store.log_lines().last().map(String::as_str), Some("rollback"));
    }

    #[tokio::test]
    async fn repeated_product_within_stock_is_decremented_per_entry() {
        let store = ScriptedStore::with_stock(&[(1, 9, 5, 100)]);

        let confirmation = place_order(&store, &request(&[(1, 2), (1, 3)])).await.unwrap();
        assert_eq!(confirmation.total_amount, 500);

        let decrements: Vec<_> = store
            .log_lines()
            .into_iter()
            .filter(|l| l.starts_with("decrement"))
            .collect();
        assert_eq!(
            decrements,
            vec!["decrement product=1 qty=2", "decrement product=1 qty=3"]
        );
    }

    #[tokio::test]
    async fn items_are_processed_in_request_order() {
        let store = ScriptedStore::with_stock(&[(1, 9, 5, 100), (2, 9, 5, 50), (3, 9, 5, 10)]);

        place_order(&store, &request(&[(3, 1), (1, 1), (2, 1)]))
            .await
            .unwrap();

        let locks: Vec<_> = store
            .log_lines()
            .into_iter()
            .filter(|l| l.starts_with("lock"))
            .collect();
        assert_eq!(locks, vec!["lock 3", "lock 1", "lock 2"]);
    }

    #[tokio::test]
    async fn store_failure_rolls_back_and_is_not_user_correctable() {
        let mut store = ScriptedStore::with_stock(&[(1, 9, 5, 100)]);
        store.fail_on_insert_order = true;

        let err = place_order(&store, &request(&[(1, 1)])).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Store(_)));
        assert!(!err.is_user_correctable());
        assert_eq!(store.log_lines().last().map(String::as_str), Some("rollback"));
    }

    #[tokio::test]
    async fn missing_product_under_locked_inventory_is_an_integrity_error() {
        let mut store = ScriptedStore::with_stock(&[]);
        store
            .stock
            .insert((ProductId::new(1), UserId::new(9)), 5);
        // No price row for product 1.

        let err = place_order(&store, &request(&[(1, 1)])).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Store(StoreError::Integrity(_))));
    }

    #[tokio::test]
    async fn overflowing_total_is_rejected_before_persisting() {
        let store = ScriptedStore::with_stock(&[(1, 9, u64::MAX, u64::MAX)]);

        let err = place_order(&store, &request(&[(1, 2)])).await.unwrap_err();
        assert!(matches!(err, CheckoutError::TotalOverflow { .. }));
        assert_eq!(store.log_lines().last().map(String::as_str), Some("rollback"));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 128,
                ..ProptestConfig::default()
            })]

            /// Property: with ample stock, the returned total equals the sum
            /// of canonical price times quantity over all entries, and each
            /// entry is decremented by exactly its quantity.
            #[test]
            fn totals_and_decrements_match_the_request(
                entries in proptest::collection::vec((1i64..20, 1u64..50, 1u64..10_000), 1..8)
            ) {
                let rt = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                rt.block_on(async {
                    let mut store = ScriptedStore::default();
                    let mut expected_total: u64 = 0;
                    let mut items = Vec::new();

                    for &(product, quantity, price) in &entries {
                        let key = (ProductId::new(product), UserId::new(9));
                        // Enough stock for every occurrence of the product.
                        *store.stock.entry(key).or_insert(0) += quantity;
                        store.prices.entry(ProductId::new(product)).or_insert(price);

                        let unit_price = store.prices[&ProductId::new(product)];
                        expected_total += unit_price * quantity;
                        items.push((product, quantity));
                    }

                    let confirmation = place_order(&store, &request(&items)).await.unwrap();
                    assert_eq!(confirmation.total_amount, expected_total);

                    let decrements: Vec<_> = store
                        .log_lines()
                        .into_iter()
                        .filter(|l| l.starts_with("decrement"))
                        .collect();
                    let expected: Vec<_> = items
                        .iter()
                        .map(|(p, q)| format!("decrement product={p} qty={q}"))
                        .collect();
                    assert_eq!(decrements, expected);
                });
            }
        }
    }
}
