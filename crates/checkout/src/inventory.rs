//! Stock reservation ledger for a single checkout.

use std::collections::HashMap;

use common::{Money, ProductId, UserId};
use domain::{DomainError, Product};
use store::MarketStore;

/// A successful stock reservation for one request line.
#[derive(Debug, Clone)]
pub struct Reservation {
    /// The reserved product.
    pub product_id: ProductId,

    /// Seller owning the product at reservation time.
    pub seller_id: UserId,

    /// Units reserved.
    pub quantity: u32,

    /// Unit price read at reservation time; this is what gets frozen into
    /// the order line.
    pub unit_price: Money,
}

/// Accumulates stock draw-downs for one checkout without committing them.
///
/// Each product is resolved from the store once; further reservations in
/// the same checkout are applied to the working copy, so repeated lines
/// for one product see the cumulative draw-down. The ledger never writes:
/// the staged products join the caller's unit of work via
/// [`StockLedger::into_reserved`], and an abandoned ledger leaves no trace.
pub struct StockLedger<'a, S: MarketStore> {
    store: &'a S,
    reserved: HashMap<ProductId, Product>,
}

impl<'a, S: MarketStore> StockLedger<'a, S> {
    /// Creates an empty ledger over the given store.
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            reserved: HashMap::new(),
        }
    }

    /// Reserves `quantity` units of a product.
    ///
    /// Fails `NotFound` when the product id does not resolve,
    /// `ProductUnavailable` when it is not listed, and `InsufficientStock`
    /// when the quantity is zero or exceeds the (working-set) stock.
    pub async fn reserve(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Reservation, DomainError> {
        let mut product = match self.reserved.remove(&product_id) {
            Some(staged) => staged,
            None => self
                .store
                .get_product(product_id)
                .await
                .map_err(|err| {
                    tracing::error!(error = %err, %product_id, "store failure resolving product");
                    DomainError::Internal
                })?
                .ok_or(DomainError::NotFound {
                    entity: "product",
                    id: product_id.to_string(),
                })?,
        };

        product.reserve(quantity)?;

        let reservation = Reservation {
            product_id,
            seller_id: product.seller_id(),
            quantity,
            unit_price: product.price(),
        };
        self.reserved.insert(product_id, product);
        Ok(reservation)
    }

    /// Hands the staged products (stock drawn down, versions as read) to
    /// the caller's unit of work.
    pub fn into_reserved(self) -> Vec<Product> {
        self.reserved.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use store::InMemoryStore;

    async fn seed(store: &InMemoryStore, stock: u32, available: bool) -> Product {
        let product = Product::new(
            ProductId::new(),
            UserId::new(),
            "Widget",
            Money::from_cents(1000),
            stock,
            Utc::now(),
        )
        .unwrap()
        .with_availability(available);
        store.save_product(product).await.unwrap()
    }

    #[tokio::test]
    async fn reserve_captures_price_and_seller() {
        let store = InMemoryStore::new();
        let product = seed(&store, 10, true).await;

        let mut ledger = StockLedger::new(&store);
        let reservation = ledger.reserve(product.id(), 3).await.unwrap();

        assert_eq!(reservation.unit_price, product.price());
        assert_eq!(reservation.seller_id, product.seller_id());
        assert_eq!(reservation.quantity, 3);
    }

    #[tokio::test]
    async fn repeated_reservations_share_the_working_copy() {
        let store = InMemoryStore::new();
        let product = seed(&store, 4, true).await;

        let mut ledger = StockLedger::new(&store);
        ledger.reserve(product.id(), 2).await.unwrap();
        let result = ledger.reserve(product.id(), 3).await;

        assert!(matches!(
            result,
            Err(DomainError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn reservations_never_touch_the_store() {
        let store = InMemoryStore::new();
        let product = seed(&store, 10, true).await;

        let mut ledger = StockLedger::new(&store);
        ledger.reserve(product.id(), 9).await.unwrap();
        drop(ledger);

        let stored = store.get_product(product.id()).await.unwrap().unwrap();
        assert_eq!(stored.stock(), 10);
    }

    #[tokio::test]
    async fn unknown_product_fails_not_found() {
        let store = InMemoryStore::new();
        let mut ledger = StockLedger::new(&store);

        let result = ledger.reserve(ProductId::new(), 1).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn unlisted_product_fails_unavailable() {
        let store = InMemoryStore::new();
        let product = seed(&store, 10, false).await;

        let mut ledger = StockLedger::new(&store);
        let result = ledger.reserve(product.id(), 1).await;
        assert!(matches!(result, Err(DomainError::ProductUnavailable { .. })));
    }

    #[tokio::test]
    async fn into_reserved_carries_drawn_down_stock() {
        let store = InMemoryStore::new();
        let product = seed(&store, 10, true).await;

        let mut ledger = StockLedger::new(&store);
        ledger.reserve(product.id(), 4).await.unwrap();

        let staged = ledger.into_reserved();
        assert_eq!(staged.len(), 1);
        assert_eq!(staged[0].stock(), 6);
        assert_eq!(staged[0].version(), product.version());
    }
}
