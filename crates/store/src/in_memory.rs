//! In-memory store.
//!
//! Intended for tests/dev. Not optimized for performance, but the
//! transactional semantics are real: row locks are asynchronous mutexes
//! keyed by `(product_id, seller_id)` held until commit/rollback, and a
//! transaction buffers every write until commit, so the engine's
//! atomicity and concurrency properties can be exercised without a
//! database.
//!
//! Unlike Postgres there is no deadlock detection; callers that lock
//! multiple rows must not invert lock order across transactions (the
//! placement engine locks in request order, one request at a time).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use storekeep_auth::{NewUser, User};
use storekeep_catalog::{Category, NewProduct, Product};
use storekeep_checkout::{
    CheckoutStore, CheckoutTransaction, NewLineItem, Order, OrderLineItem, StoreError,
};
use storekeep_core::{CategoryId, CustomerId, LineItemId, OrderId, ProductId, UserId};
use storekeep_customers::{Customer, NewCustomer};
use storekeep_inventory::{InventoryRecord, StockReceipt};

type InventoryKey = (ProductId, UserId);

#[derive(Debug, Default)]
struct Counters {
    user: i64,
    customer: i64,
    category: i64,
    product: i64,
    order: i64,
    line_item: i64,
}

#[derive(Debug, Default)]
struct State {
    users: Vec<User>,
    customers: Vec<Customer>,
    categories: Vec<Category>,
    products: Vec<Product>,
    inventory: HashMap<InventoryKey, InventoryRecord>,
    orders: Vec<Order>,
    line_items: Vec<OrderLineItem>,
    counters: Counters,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    row_locks: Mutex<HashMap<InventoryKey, Arc<AsyncMutex<()>>>>,
}

/// In-memory implementation of the store surfaces exercised by tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.inner.state()
    }

    pub fn create_user(&self, new: &NewUser) -> Result<User, StoreError> {
        let mut state = self.state()?;
        if state.users.iter().any(|u| u.email == new.email) {
            return Err(StoreError::Constraint(format!(
                "duplicate e-mail: {}",
                new.email
            )));
        }
        state.counters.user += 1;
        let user = User {
            id: UserId::new(state.counters.user),
            name: new.name.clone(),
            email: new.email.clone(),
            password_hash: new.password_hash.clone(),
            role: new.role,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.state()?.users.iter().find(|u| u.email == email).cloned())
    }

    pub fn create_customer(&self, new: &NewCustomer) -> Result<Customer, StoreError> {
        let mut state = self.state()?;
        state.counters.customer += 1;
        let customer = Customer {
            id: CustomerId::new(state.counters.customer),
            unique_id: new.unique_id.clone(),
            name: new.name.clone(),
            phone: new.phone.clone(),
            email: new.email.clone(),
            zip_code: new.zip_code.clone(),
            city: new.city.clone(),
            state: new.state.clone(),
        };
        state.customers.push(customer.clone());
        Ok(customer)
    }

    /// Create a product, resolving (or creating) its category by name.
    pub fn create_product(&self, new: &NewProduct) -> Result<Product, StoreError> {
        let mut state = self.state()?;
        let category_id = match state.categories.iter().find(|c| c.name == new.category) {
            Some(category) => category.id,
            None => {
                state.counters.category += 1;
                let id = CategoryId::new(state.counters.category);
                state.categories.push(Category {
                    id,
                    name: new.category.clone(),
                });
                id
            }
        };
        state.counters.product += 1;
        let product = Product {
            id: ProductId::new(state.counters.product),
            name: new.name.clone(),
            price: new.price,
            expiry_date: new.expiry_date,
            category_id,
        };
        state.products.push(product.clone());
        Ok(product)
    }

    /// Add received stock for a seller (accumulating upsert).
    pub fn receive_stock(
        &self,
        seller_id: UserId,
        batch: &[StockReceipt],
    ) -> Result<usize, StoreError> {
        let mut state = self.state()?;
        let now = Utc::now();
        for receipt in batch {
            state
                .inventory
                .entry((receipt.product_id, seller_id))
                .or_insert_with(|| InventoryRecord {
                    product_id: receipt.product_id,
                    seller_id,
                    stock: 0,
                    last_updated: now,
                })
                .receive(receipt.quantity, now);
        }
        Ok(batch.len())
    }

    pub fn stock_of(
        &self,
        product_id: ProductId,
        seller_id: UserId,
    ) -> Result<Option<u64>, StoreError> {
        Ok(self
            .state()?
            .inventory
            .get(&(product_id, seller_id))
            .map(|r| r.stock))
    }

    pub fn inventory_record(
        &self,
        product_id: ProductId,
        seller_id: UserId,
    ) -> Result<Option<InventoryRecord>, StoreError> {
        Ok(self
            .state()?
            .inventory
            .get(&(product_id, seller_id))
            .cloned())
    }

    pub fn orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.state()?.orders.clone())
    }

    pub fn line_items(&self) -> Result<Vec<OrderLineItem>, StoreError> {
        Ok(self.state()?.line_items.clone())
    }
}

impl Inner {
    fn state(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("state lock poisoned".to_string()))
    }

    fn row_lock(&self, key: InventoryKey) -> Result<Arc<AsyncMutex<()>>, StoreError> {
        let mut locks = self
            .row_locks
            .lock()
            .map_err(|_| StoreError::Unavailable("lock table poisoned".to_string()))?;
        Ok(Arc::clone(locks.entry(key).or_default()))
    }
}

/// One open in-memory transaction: held row locks plus buffered writes.
pub struct InMemoryTx {
    inner: Arc<Inner>,
    guards: HashMap<InventoryKey, OwnedMutexGuard<()>>,
    staged_orders: Vec<Order>,
    staged_lines: Vec<OrderLineItem>,
    staged_decrements: Vec<(InventoryKey, u64)>,
}

#[async_trait]
impl CheckoutStore for InMemoryStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        Ok(InMemoryTx {
            inner: Arc::clone(&self.inner),
            guards: HashMap::new(),
            staged_orders: Vec::new(),
            staged_lines: Vec::new(),
            staged_decrements: Vec::new(),
        })
    }
}

#[async_trait]
impl CheckoutTransaction for InMemoryTx {
    async fn lock_inventory(
        &mut self,
        product_id: ProductId,
        seller_id: UserId,
    ) -> Result<Option<u64>, StoreError> {
        let key = (product_id, seller_id);
        // Re-locking a row this transaction already holds must not
        // self-deadlock (repeated products in one order do exactly that).
        if !self.guards.contains_key(&key) {
            let lock = self.inner.row_lock(key)?;
            let guard = lock.lock_owned().await;
            self.guards.insert(key, guard);
        }
        Ok(self.inner.state()?.inventory.get(&key).map(|r| r.stock))
    }

    async fn product_price(&mut self, product_id: ProductId) -> Result<u64, StoreError> {
        self.inner
            .state()?
            .products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.price)
            .ok_or_else(|| {
                StoreError::Integrity(format!("product {product_id} has no catalog row"))
            })
    }

    async fn insert_order(
        &mut self,
        customer_id: CustomerId,
        total_amount: u64,
    ) -> Result<OrderId, StoreError> {
        // Ids come from a sequence: consumed even if this transaction later
        // rolls back, matching SQL sequence behavior.
        let mut state = self.inner.state()?;
        state.counters.order += 1;
        let id = OrderId::new(state.counters.order);
        drop(state);

        self.staged_orders.push(Order {
            id,
            customer_id,
            total_amount,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn insert_line_item(&mut self, line: &NewLineItem) -> Result<(), StoreError> {
        let mut state = self.inner.state()?;
        state.counters.line_item += 1;
        let id = LineItemId::new(state.counters.line_item);
        drop(state);

        self.staged_lines.push(OrderLineItem {
            id,
            order_id: line.order_id,
            product_id: line.product_id,
            seller_id: line.seller_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
        });
        Ok(())
    }

    async fn decrement_stock(
        &mut self,
        product_id: ProductId,
        seller_id: UserId,
        quantity: u64,
    ) -> Result<(), StoreError> {
        if !self.guards.contains_key(&(product_id, seller_id)) {
            return Err(StoreError::Integrity(format!(
                "decrement without a lock on ({product_id}, {seller_id})"
            )));
        }
        self.staged_decrements.push(((product_id, seller_id), quantity));
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut state = self.inner.state()?;

        // Validate every decrement before applying any: commit stays
        // all-or-nothing even against a buggy caller.
        let mut totals: HashMap<InventoryKey, u64> = HashMap::new();
        for &(key, quantity) in &self.staged_decrements {
            *totals.entry(key).or_insert(0) += quantity;
        }
        for (key, total) in &totals {
            let record = state.inventory.get(key).ok_or_else(|| {
                StoreError::Integrity(format!("inventory row {key:?} vanished"))
            })?;
            if record.stock < *total {
                return Err(StoreError::Constraint(format!(
                    "stock below zero for {key:?}"
                )));
            }
        }

        let now = Utc::now();
        for (key, total) in totals {
            if let Some(record) = state.inventory.get_mut(&key) {
                record
                    .fulfill(total, now)
                    .map_err(|_| StoreError::Constraint(format!("stock below zero for {key:?}")))?;
            }
        }
        state.orders.extend(self.staged_orders);
        state.line_items.extend(self.staged_lines);

        // Row locks release when `self.guards` drops.
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        // Buffered writes are discarded; row locks release on drop.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> (InMemoryStore, ProductId, UserId) {
        let store = InMemoryStore::new();
        let product = store
            .create_product(&NewProduct {
                name: "Widget".into(),
                category: "General".into(),
                price: 100,
                expiry_date: None,
            })
            .unwrap();
        let seller = UserId::new(9);
        store
            .receive_stock(
                seller,
                &[StockReceipt {
                    product_id: product.id,
                    quantity: 5,
                }],
            )
            .unwrap();
        (store, product.id, seller)
    }

    #[tokio::test]
    async fn writes_are_invisible_until_commit() {
        let (store, product, seller) = seeded();

        let mut tx = store.begin().await.unwrap();
        tx.lock_inventory(product, seller).await.unwrap();
        tx.insert_order(CustomerId::new(1), 100).await.unwrap();
        tx.decrement_stock(product, seller, 1).await.unwrap();

        assert!(store.orders().unwrap().is_empty());
        assert_eq!(store.stock_of(product, seller).unwrap(), Some(5));

        tx.commit().await.unwrap();
        assert_eq!(store.orders().unwrap().len(), 1);
        assert_eq!(store.stock_of(product, seller).unwrap(), Some(4));
    }

    #[tokio::test]
    async fn rollback_discards_buffered_writes_and_releases_locks() {
        let (store, product, seller) = seeded();

        let mut tx = store.begin().await.unwrap();
        tx.lock_inventory(product, seller).await.unwrap();
        tx.insert_order(CustomerId::new(1), 100).await.unwrap();
        tx.decrement_stock(product, seller, 1).await.unwrap();
        tx.rollback().await.unwrap();

        assert!(store.orders().unwrap().is_empty());
        assert_eq!(store.stock_of(product, seller).unwrap(), Some(5));

        // The row is lockable again immediately.
        let mut tx2 = store.begin().await.unwrap();
        assert_eq!(
            tx2.lock_inventory(product, seller).await.unwrap(),
            Some(5)
        );
        tx2.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn relocking_a_held_row_does_not_self_deadlock() {
        let (store, product, seller) = seeded();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.lock_inventory(product, seller).await.unwrap(), Some(5));
        assert_eq!(tx.lock_inventory(product, seller).await.unwrap(), Some(5));
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn duplicate_email_is_a_constraint_violation() {
        let store = InMemoryStore::new();
        let new = NewUser::new("Ada", "ada@example.com", "hash".into(), Default::default())
            .unwrap();
        store.create_user(&new).unwrap();
        assert!(matches!(
            store.create_user(&new).unwrap_err(),
            StoreError::Constraint(_)
        ));
    }

    #[tokio::test]
    async fn receiving_stock_accumulates() {
        let (store, product, seller) = seeded();
        store
            .receive_stock(
                seller,
                &[StockReceipt {
                    product_id: product,
                    quantity: 7,
                }],
            )
            .unwrap();
        assert_eq!(store.stock_of(product, seller).unwrap(), Some(12));
    }
}
