//! Engine-against-store tests: the order placement engine running on the
//! in-memory backend, including concurrent placements.

use std::sync::Arc;

use storekeep_catalog::NewProduct;
use storekeep_checkout::{
    place_order, CheckoutError, OrderItemRequest, PlaceOrder,
};
use storekeep_core::{CustomerId, ProductId, UserId};
use storekeep_customers::NewCustomer;
use storekeep_inventory::StockReceipt;
use storekeep_store::InMemoryStore;

struct Fixture {
    store: InMemoryStore,
    customer: CustomerId,
    seller: UserId,
}

impl Fixture {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let customer = store
            .create_customer(&NewCustomer::named("Ada Lovelace"))
            .unwrap()
            .id;
        Self {
            store,
            customer,
            seller: UserId::new(9),
        }
    }

    fn product(&self, name: &str, price: u64, stock: u64) -> ProductId {
        let product = self
            .store
            .create_product(&NewProduct {
                name: name.into(),
                category: "General".into(),
                price,
                expiry_date: None,
            })
            .unwrap();
        self.store
            .receive_stock(
                self.seller,
                &[StockReceipt {
                    product_id: product.id,
                    quantity: stock,
                }],
            )
            .unwrap();
        product.id
    }

    fn request(&self, items: &[(ProductId, u64)]) -> PlaceOrder {
        PlaceOrder {
            customer_id: self.customer,
            seller_id: self.seller,
            items: items
                .iter()
                .map(|&(product_id, quantity)| OrderItemRequest {
                    product_id,
                    quantity,
                })
                .collect(),
        }
    }
}

#[tokio::test]
async fn placement_creates_order_lines_and_decrements_stock() {
    let fx = Fixture::new();
    let product = fx.product("Widget", 100, 5);

    let confirmation = place_order(&fx.store, &fx.request(&[(product, 5)]))
        .await
        .unwrap();
    assert_eq!(confirmation.total_amount, 500);

    let orders = fx.store.orders().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, confirmation.order_id);
    assert_eq!(orders[0].customer_id, fx.customer);
    assert_eq!(orders[0].total_amount, 500);

    let lines = fx.store.line_items().unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].order_id, confirmation.order_id);
    assert_eq!(lines[0].unit_price, 100);
    assert_eq!(lines[0].quantity, 5);

    assert_eq!(fx.store.stock_of(product, fx.seller).unwrap(), Some(0));
}

#[tokio::test]
async fn drained_stock_rejects_the_next_order_and_stays_at_zero() {
    let fx = Fixture::new();
    let product = fx.product("Widget", 100, 5);

    place_order(&fx.store, &fx.request(&[(product, 5)]))
        .await
        .unwrap();

    let err = place_order(&fx.store, &fx.request(&[(product, 1)]))
        .await
        .unwrap_err();
    match err {
        CheckoutError::InsufficientStock { product_id } => assert_eq!(product_id, product),
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(fx.store.stock_of(product, fx.seller).unwrap(), Some(0));
    assert_eq!(fx.store.orders().unwrap().len(), 1);
}

#[tokio::test]
async fn one_failing_line_rolls_back_the_whole_order() {
    let fx = Fixture::new();
    let plenty = fx.product("Widget", 100, 10);
    let scarce = fx.product("Gadget", 50, 1);

    let err = place_order(&fx.store, &fx.request(&[(plenty, 2), (scarce, 4)]))
        .await
        .unwrap_err();
    match err {
        CheckoutError::InsufficientStock { product_id } => assert_eq!(product_id, scarce),
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // No order, no line items, no stock movement on either product.
    assert!(fx.store.orders().unwrap().is_empty());
    assert!(fx.store.line_items().unwrap().is_empty());
    assert_eq!(fx.store.stock_of(plenty, fx.seller).unwrap(), Some(10));
    assert_eq!(fx.store.stock_of(scarce, fx.seller).unwrap(), Some(1));
}

#[tokio::test]
async fn duplicate_entries_fail_sequentially_and_roll_back() {
    let fx = Fixture::new();
    let product = fx.product("Widget", 100, 5);

    // First (1,3) passes against locked stock 5; the second sees 2 left.
    let err = place_order(&fx.store, &fx.request(&[(product, 3), (product, 3)]))
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::InsufficientStock { .. }));
    assert_eq!(fx.store.stock_of(product, fx.seller).unwrap(), Some(5));
    assert!(fx.store.orders().unwrap().is_empty());
}

#[tokio::test]
async fn multi_product_totals_capture_canonical_prices() {
    let fx = Fixture::new();
    let widget = fx.product("Widget", 250, 10);
    let gadget = fx.product("Gadget", 1000, 10);

    let confirmation = place_order(&fx.store, &fx.request(&[(widget, 3), (gadget, 2)]))
        .await
        .unwrap();
    assert_eq!(confirmation.total_amount, 3 * 250 + 2 * 1000);

    let lines = fx.store.line_items().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].unit_price, 250);
    assert_eq!(lines[1].unit_price, 1000);
    assert_eq!(fx.store.stock_of(widget, fx.seller).unwrap(), Some(7));
    assert_eq!(fx.store.stock_of(gadget, fx.seller).unwrap(), Some(8));
}

#[tokio::test]
async fn placement_touches_the_inventory_timestamp() {
    let fx = Fixture::new();
    let product = fx.product("Widget", 100, 5);
    let before = fx
        .store
        .inventory_record(product, fx.seller)
        .unwrap()
        .unwrap()
        .last_updated;

    place_order(&fx.store, &fx.request(&[(product, 1)]))
        .await
        .unwrap();

    let after = fx
        .store
        .inventory_record(product, fx.seller)
        .unwrap()
        .unwrap()
        .last_updated;
    assert!(after >= before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn contested_stock_admits_exactly_one_winner() {
    let fx = Fixture::new();
    let product = fx.product("Widget", 100, 5);
    let store = Arc::new(fx.store.clone());

    // Two concurrent orders of 3 against stock 5: combined demand exceeds
    // stock, so exactly one may win.
    let request = fx.request(&[(product, 3)]);
    let mut handles = Vec::new();
    for _ in 0..2 {
        let store = Arc::clone(&store);
        let request = request.clone();
        handles.push(tokio::spawn(async move {
            place_order(store.as_ref(), &request).await
        }));
    }

    let mut successes = 0;
    let mut stock_errors = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(CheckoutError::InsufficientStock { .. }) => stock_errors += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(stock_errors, 1);
    assert_eq!(store.stock_of(product, fx.seller).unwrap(), Some(2));
    assert_eq!(store.orders().unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn contested_stock_admits_both_when_demand_fits() {
    let fx = Fixture::new();
    let product = fx.product("Widget", 100, 5);
    let store = Arc::new(fx.store.clone());

    let first = fx.request(&[(product, 2)]);
    let second = fx.request(&[(product, 3)]);
    let (a, b) = tokio::join!(
        place_order(store.as_ref(), &first),
        place_order(store.as_ref(), &second),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(store.stock_of(product, fx.seller).unwrap(), Some(0));
    assert_eq!(store.orders().unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disjoint_pairs_do_not_block_each_other() {
    let fx = Fixture::new();
    let widget = fx.product("Widget", 100, 5);
    let gadget = fx.product("Gadget", 50, 5);
    let store = Arc::new(fx.store.clone());

    let first = fx.request(&[(widget, 5)]);
    let second = fx.request(&[(gadget, 5)]);
    let (a, b) = tokio::join!(
        place_order(store.as_ref(), &first),
        place_order(store.as_ref(), &second),
    );
    a.unwrap();
    b.unwrap();

    assert_eq!(store.stock_of(widget, fx.seller).unwrap(), Some(0));
    assert_eq!(store.stock_of(gadget, fx.seller).unwrap(), Some(0));
    assert_eq!(store.orders().unwrap().len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn hammered_stock_never_goes_negative() {
    let fx = Fixture::new();
    let product = fx.product("Widget", 100, 10);
    let store = Arc::new(fx.store.clone());

    // Sixteen concurrent single-unit orders against stock 10.
    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = Arc::clone(&store);
        let request = fx.request(&[(product, 1)]);
        handles.push(tokio::spawn(async move {
            place_order(store.as_ref(), &request).await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 10);
    assert_eq!(store.stock_of(product, fx.seller).unwrap(), Some(0));
    assert_eq!(store.orders().unwrap().len(), 10);
}
