//! Seller earnings aggregation.

use chrono::{DateTime, Utc};
use common::Money;
use domain::{DomainError, OrderStatus, Principal, auth};
use store::MarketStore;

/// Aggregates a seller's `price_at_purchase * quantity` over a closed time
/// interval.
///
/// Only orders in the counted status set contribute; by default that is
/// delivered orders only. An interval with no matching orders yields
/// [`Money::zero`], never an error.
pub struct SellerEarnings<S: MarketStore> {
    store: S,
    counted: Vec<OrderStatus>,
}

impl<S: MarketStore> SellerEarnings<S> {
    /// Creates an aggregator counting delivered orders.
    pub fn new(store: S) -> Self {
        Self {
            store,
            counted: vec![OrderStatus::Delivered],
        }
    }

    /// Creates an aggregator counting the given statuses.
    pub fn with_counted_statuses(store: S, counted: Vec<OrderStatus>) -> Self {
        Self { store, counted }
    }

    /// Returns the statuses that contribute to earnings.
    pub fn counted_statuses(&self) -> &[OrderStatus] {
        &self.counted
    }

    /// Sums the caller's earnings over `[from, to]`.
    #[tracing::instrument(skip(self), fields(seller_id = %principal.user_id))]
    pub async fn earnings_between(
        &self,
        principal: &Principal,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Money, DomainError> {
        auth::seller_query(principal)?;
        self.store
            .sum_earnings(principal.user_id, &self.counted, from, to)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, seller_id = %principal.user_id, "store failure summing earnings");
                DomainError::Internal
            })
    }
}
