//! Storage contract consumed by the marketplace services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{CartId, Money, OrderId, ProductId, UserId};
use domain::{Cart, Order, OrderStatus, Product};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// An offset/limit slice of a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Rows to skip.
    pub offset: usize,
    /// Maximum rows to return.
    pub limit: usize,
}

impl PageRequest {
    /// Creates a page request.
    pub fn new(offset: usize, limit: usize) -> Self {
        Self { offset, limit }
    }

    /// The first page with the given size.
    pub fn first(limit: usize) -> Self {
        Self { offset: 0, limit }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

/// One page of results plus the unpaginated total.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
}

/// Everything a successful checkout writes, applied as one unit of work.
///
/// Staged products carry the version observed when they were read; the
/// store rejects the whole commit with [`crate::StoreError::VersionConflict`]
/// if any of them has moved since. On success the staged products, the new
/// order, and the cart clearing all become visible together.
#[derive(Debug, Clone)]
pub struct CheckoutCommit {
    /// Products with their stock already drawn down by the ledger.
    pub products: Vec<Product>,

    /// The order to persist.
    pub order: Order,

    /// Cart to clear in the same unit of work, when the buyer has one.
    pub clear_cart: Option<CartId>,
}

/// Repository contract for marketplace entities.
///
/// Implementations must make every method atomic on its own;
/// [`MarketStore::commit_checkout`] is additionally atomic across all the
/// writes it carries.
#[async_trait]
pub trait MarketStore: Send + Sync {
    /// Loads a product by id.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>>;

    /// Upserts a product, bumping its version.
    async fn save_product(&self, product: Product) -> Result<Product>;

    /// Loads a user's cart, if one has been created.
    async fn get_cart(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Replaces the user's cart wholesale.
    async fn save_cart(&self, cart: Cart) -> Result<()>;

    /// Deletes every line of the given cart. `Ok` on an already-empty cart.
    async fn delete_cart_lines(&self, cart_id: CartId) -> Result<()>;

    /// Loads an order by id.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>>;

    /// Upserts an order.
    async fn save_order(&self, order: Order) -> Result<()>;

    /// Orders placed by the user, newest first.
    async fn find_orders_by_user(&self, user_id: UserId, page: PageRequest)
    -> Result<Page<Order>>;

    /// Orders containing at least one of the seller's lines, newest first,
    /// optionally restricted to one status.
    async fn find_orders_by_seller(
        &self,
        seller_id: UserId,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>>;

    /// Sum of `price_at_purchase * quantity` over the seller's lines in
    /// orders whose status is in `statuses` and whose order date lies in
    /// the closed interval `[from, to]`. Zero when nothing matches.
    async fn sum_earnings(
        &self,
        seller_id: UserId,
        statuses: &[OrderStatus],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Money>;

    /// Applies a checkout as one all-or-nothing unit of work.
    async fn commit_checkout(&self, commit: CheckoutCommit) -> Result<()>;
}
