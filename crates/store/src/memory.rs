use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartId, Money, OrderId, ProductId, UserId};
use domain::{Cart, Order, OrderStatus, Product};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{CheckoutCommit, MarketStore, Page, PageRequest},
};

#[derive(Default)]
struct State {
    products: HashMap<ProductId, Product>,
    carts: HashMap<UserId, Cart>,
    orders: HashMap<OrderId, Order>,
}

/// In-memory store implementation.
///
/// Holds all entities behind one `RwLock`, which makes
/// [`MarketStore::commit_checkout`] trivially atomic: version checks run
/// before any write, and all writes happen under a single write guard.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored products.
    pub async fn product_count(&self) -> usize {
        self.state.read().await.products.len()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Clears all stored entities.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.products.clear();
        state.carts.clear();
        state.orders.clear();
    }
}

fn paginate(mut orders: Vec<Order>, page: PageRequest) -> Page<Order> {
    // Newest first, stable across equal timestamps.
    orders.sort_by(|a, b| {
        b.order_date()
            .cmp(&a.order_date())
            .then_with(|| b.id().as_uuid().cmp(&a.id().as_uuid()))
    });
    let total = orders.len();
    let items = orders.into_iter().skip(page.offset).take(page.limit).collect();
    Page { items, total }
}

#[async_trait]
impl MarketStore for InMemoryStore {
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&id).cloned())
    }

    async fn save_product(&self, mut product: Product) -> Result<Product> {
        product.bump_version();
        let mut state = self.state.write().await;
        state.products.insert(product.id(), product.clone());
        Ok(product)
    }

    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>> {
        Ok(self.state.read().await.carts.get(&user_id).cloned())
    }

    async fn save_cart(&self, cart: Cart) -> Result<()> {
        let mut state = self.state.write().await;
        state.carts.insert(cart.user_id(), cart);
        Ok(())
    }

    async fn delete_cart_lines(&self, cart_id: CartId) -> Result<()> {
        let mut state = self.state.write().await;
        let cart = state
            .carts
            .values_mut()
            .find(|cart| cart.id() == cart_id)
            .ok_or(StoreError::NotFound {
                entity: "cart",
                id: cart_id.to_string(),
            })?;
        cart.clear();
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.state.read().await.orders.get(&id).cloned())
    }

    async fn save_order(&self, order: Order) -> Result<()> {
        let mut state = self.state.write().await;
        state.orders.insert(order.id(), order);
        Ok(())
    }

    async fn find_orders_by_user(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Order>> {
        let state = self.state.read().await;
        let orders: Vec<Order> = state
            .orders
            .values()
            .filter(|order| order.user_id() == user_id)
            .cloned()
            .collect();
        Ok(paginate(orders, page))
    }

    async fn find_orders_by_seller(
        &self,
        seller_id: UserId,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>> {
        let state = self.state.read().await;
        let orders: Vec<Order> = state
            .orders
            .values()
            .filter(|order| order.contains_seller(seller_id))
            .filter(|order| status.is_none_or(|wanted| order.status() == wanted))
            .cloned()
            .collect();
        Ok(paginate(orders, page))
    }

    async fn sum_earnings(
        &self,
        seller_id: UserId,
        statuses: &[OrderStatus],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Money> {
        let state = self.state.read().await;
        let total = state
            .orders
            .values()
            .filter(|order| statuses.contains(&order.status()))
            .filter(|order| order.order_date() >= from && order.order_date() <= to)
            .flat_map(|order| order.lines())
            .filter(|line| line.seller_id == seller_id)
            .map(|line| line.subtotal())
            .sum();
        Ok(total)
    }

    async fn commit_checkout(&self, commit: CheckoutCommit) -> Result<()> {
        let mut state = self.state.write().await;

        // Validate every staged version before touching anything, so a
        // rejected commit leaves the store exactly as it was.
        for staged in &commit.products {
            let stored = state
                .products
                .get(&staged.id())
                .ok_or(StoreError::NotFound {
                    entity: "product",
                    id: staged.id().to_string(),
                })?;
            if stored.version() != staged.version() {
                return Err(StoreError::VersionConflict {
                    product_id: staged.id(),
                    staged: staged.version(),
                    stored: stored.version(),
                });
            }
        }

        for mut staged in commit.products {
            staged.bump_version();
            state.products.insert(staged.id(), staged);
        }

        state.orders.insert(commit.order.id(), commit.order);

        if let Some(cart_id) = commit.clear_cart
            && let Some(cart) = state.carts.values_mut().find(|cart| cart.id() == cart_id)
        {
            cart.clear();
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{OrderLine, PaymentMethod};

    async fn seed_product(store: &InMemoryStore, stock: u32) -> Product {
        let product = Product::new(
            ProductId::new(),
            UserId::new(),
            "Widget",
            Money::from_cents(1000),
            stock,
            Utc::now(),
        )
        .unwrap();
        store.save_product(product).await.unwrap()
    }

    fn order_for(user_id: UserId, product: &Product, quantity: u32, date: DateTime<Utc>) -> Order {
        Order::new(
            OrderId::new(),
            user_id,
            vec![OrderLine::new(
                product.id(),
                product.seller_id(),
                quantity,
                product.price(),
            )],
            "12 Main Street",
            PaymentMethod::CreditCard,
            date,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn save_product_bumps_version() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 5).await;
        assert_eq!(product.version(), 1);

        let saved = store.save_product(product).await.unwrap();
        assert_eq!(saved.version(), 2);
        assert_eq!(
            store.get_product(saved.id()).await.unwrap().unwrap().version(),
            2
        );
    }

    #[tokio::test]
    async fn commit_applies_products_order_and_cart_clearing() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let mut staged = seed_product(&store, 10).await;

        let mut cart = Cart::new(user_id, Utc::now());
        cart.add(staged.id(), 2);
        store.save_cart(cart.clone()).await.unwrap();

        staged.reserve(4).unwrap();
        let order = order_for(user_id, &staged, 4, Utc::now());
        store
            .commit_checkout(CheckoutCommit {
                products: vec![staged.clone()],
                order: order.clone(),
                clear_cart: Some(cart.id()),
            })
            .await
            .unwrap();

        let stored = store.get_product(staged.id()).await.unwrap().unwrap();
        assert_eq!(stored.stock(), 6);
        assert_eq!(stored.version(), 2);
        assert!(store.get_order(order.id()).await.unwrap().is_some());
        assert!(store.get_cart(user_id).await.unwrap().unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_with_stale_version_writes_nothing() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let mut staged = seed_product(&store, 10).await;

        // Another writer moves the product on.
        store
            .save_product(store.get_product(staged.id()).await.unwrap().unwrap())
            .await
            .unwrap();

        staged.reserve(4).unwrap();
        let order = order_for(user_id, &staged, 4, Utc::now());
        let result = store
            .commit_checkout(CheckoutCommit {
                products: vec![staged.clone()],
                order,
                clear_cart: None,
            })
            .await;

        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
        let stored = store.get_product(staged.id()).await.unwrap().unwrap();
        assert_eq!(stored.stock(), 10);
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn commit_checks_versions_before_applying_any_write() {
        let store = InMemoryStore::new();
        let mut first = seed_product(&store, 10).await;
        let mut second = seed_product(&store, 10).await;

        // Only the second product is stale.
        store
            .save_product(store.get_product(second.id()).await.unwrap().unwrap())
            .await
            .unwrap();

        first.reserve(1).unwrap();
        second.reserve(1).unwrap();
        let order = order_for(UserId::new(), &first, 1, Utc::now());
        let result = store
            .commit_checkout(CheckoutCommit {
                products: vec![first.clone(), second],
                order,
                clear_cart: None,
            })
            .await;

        assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
        let stored = store.get_product(first.id()).await.unwrap().unwrap();
        assert_eq!(stored.stock(), 10);
    }

    #[tokio::test]
    async fn delete_cart_lines_empties_the_cart() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let mut cart = Cart::new(user_id, Utc::now());
        cart.add(ProductId::new(), 3);
        store.save_cart(cart.clone()).await.unwrap();

        store.delete_cart_lines(cart.id()).await.unwrap();
        assert!(store.get_cart(user_id).await.unwrap().unwrap().is_empty());

        // Already empty is still fine.
        store.delete_cart_lines(cart.id()).await.unwrap();
    }

    #[tokio::test]
    async fn delete_cart_lines_for_unknown_cart_fails() {
        let store = InMemoryStore::new();
        let result = store.delete_cart_lines(CartId::new()).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn find_orders_by_user_is_newest_first_and_paginated() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let product = seed_product(&store, 100).await;

        let base = Utc::now();
        for i in 0..5 {
            let date = base + chrono::Duration::minutes(i);
            store
                .save_order(order_for(user_id, &product, 1, date))
                .await
                .unwrap();
        }
        store
            .save_order(order_for(UserId::new(), &product, 1, base))
            .await
            .unwrap();

        let page = store
            .find_orders_by_user(user_id, PageRequest::new(0, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert!(page.items[0].order_date() > page.items[1].order_date());

        let rest = store
            .find_orders_by_user(user_id, PageRequest::new(4, 2))
            .await
            .unwrap();
        assert_eq!(rest.items.len(), 1);
    }

    #[tokio::test]
    async fn find_orders_by_seller_filters_by_status() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 100).await;
        let seller_id = product.seller_id();

        let mut delivered = order_for(UserId::new(), &product, 1, Utc::now());
        delivered.set_status(OrderStatus::Delivered);
        store.save_order(delivered).await.unwrap();
        store
            .save_order(order_for(UserId::new(), &product, 1, Utc::now()))
            .await
            .unwrap();

        let all = store
            .find_orders_by_seller(seller_id, None, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);

        let delivered_only = store
            .find_orders_by_seller(seller_id, Some(OrderStatus::Delivered), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(delivered_only.total, 1);
        assert_eq!(delivered_only.items[0].status(), OrderStatus::Delivered);
    }

    #[tokio::test]
    async fn sum_earnings_counts_only_matching_orders() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 100).await;
        let seller_id = product.seller_id();
        let now = Utc::now();

        let mut delivered = order_for(UserId::new(), &product, 3, now);
        delivered.set_status(OrderStatus::Delivered);
        store.save_order(delivered).await.unwrap();

        // Pending order and an out-of-range delivered order are not counted.
        store
            .save_order(order_for(UserId::new(), &product, 5, now))
            .await
            .unwrap();
        let mut old = order_for(UserId::new(), &product, 5, now - chrono::Duration::days(30));
        old.set_status(OrderStatus::Delivered);
        store.save_order(old).await.unwrap();

        let earnings = store
            .sum_earnings(
                seller_id,
                &[OrderStatus::Delivered],
                now - chrono::Duration::days(1),
                now + chrono::Duration::days(1),
            )
            .await
            .unwrap();
        assert_eq!(earnings.cents(), 3000);
    }

    #[tokio::test]
    async fn sum_earnings_is_zero_for_no_matches() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let earnings = store
            .sum_earnings(UserId::new(), &[OrderStatus::Delivered], now, now)
            .await
            .unwrap();
        assert_eq!(earnings, Money::zero());
    }
}
