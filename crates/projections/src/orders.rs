//! Ownership-checked order lookups and paginated listings.

use common::OrderId;
use domain::{DomainError, Order, OrderStatus, Principal, auth};
use store::{MarketStore, Page, PageRequest};

/// Read-only order queries.
pub struct OrderQueries<S: MarketStore> {
    store: S,
}

impl<S: MarketStore> OrderQueries<S> {
    /// Creates a new query facade over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Orders placed by the caller, newest first.
    #[tracing::instrument(skip(self), fields(user_id = %principal.user_id))]
    pub async fn orders_for_user(
        &self,
        principal: &Principal,
        page: PageRequest,
    ) -> Result<Page<Order>, DomainError> {
        auth::view_own_orders(principal)?;
        self.store
            .find_orders_by_user(principal.user_id, page)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, user_id = %principal.user_id, "store failure listing orders");
                DomainError::Internal
            })
    }

    /// Orders containing at least one of the caller's lines, newest first,
    /// optionally restricted to one status.
    #[tracing::instrument(skip(self), fields(seller_id = %principal.user_id))]
    pub async fn orders_for_seller(
        &self,
        principal: &Principal,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, DomainError> {
        auth::seller_query(principal)?;
        self.store
            .find_orders_by_seller(principal.user_id, status, page)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, seller_id = %principal.user_id, "store failure listing orders");
                DomainError::Internal
            })
    }

    /// A single order, visible to the buyer who placed it.
    #[tracing::instrument(skip(self), fields(user_id = %principal.user_id, %order_id))]
    pub async fn order_for_user(
        &self,
        principal: &Principal,
        order_id: OrderId,
    ) -> Result<Order, DomainError> {
        let order = self.get_order(order_id).await?;
        auth::view_order_as_buyer(principal, &order)?;
        Ok(order)
    }

    /// A single order, visible to a seller with at least one line in it.
    #[tracing::instrument(skip(self), fields(seller_id = %principal.user_id, %order_id))]
    pub async fn order_for_seller(
        &self,
        principal: &Principal,
        order_id: OrderId,
    ) -> Result<Order, DomainError> {
        auth::seller_query(principal)?;
        let order = self.get_order(order_id).await?;
        auth::view_order_as_seller(principal, &order)?;
        Ok(order)
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Order, DomainError> {
        self.store
            .get_order(order_id)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, %order_id, "store failure loading order");
                DomainError::Internal
            })?
            .ok_or(DomainError::NotFound {
                entity: "order",
                id: order_id.to_string(),
            })
    }
}
