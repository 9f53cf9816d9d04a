//! Seller-driven order status updates.

use std::time::Duration;

use common::OrderId;
use domain::{DomainError, Order, OrderStatus, Principal, auth};
use store::MarketStore;

use crate::clock::Clock;
use crate::notify::{NotificationKind, NotificationSink};

/// Applies status transitions on behalf of sellers.
pub struct OrderStatusService<S, N, C>
where
    S: MarketStore,
    N: NotificationSink,
    C: Clock,
{
    store: S,
    notifier: N,
    clock: C,
    notify_timeout: Duration,
}

impl<S, N, C> OrderStatusService<S, N, C>
where
    S: MarketStore,
    N: NotificationSink,
    C: Clock,
{
    /// Creates a new status service.
    pub fn new(store: S, notifier: N, clock: C, notify_timeout: Duration) -> Self {
        Self {
            store,
            notifier,
            clock,
            notify_timeout,
        }
    }

    /// Moves an order to `new_status`.
    ///
    /// The caller must be a seller with at least one line in the order; the
    /// transition itself is unconstrained (see [`OrderStatus`]). Every
    /// distinct seller in the order is notified best-effort afterwards.
    #[tracing::instrument(skip(self), fields(user_id = %principal.user_id, %order_id))]
    pub async fn update_status(
        &self,
        principal: &Principal,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, DomainError> {
        auth::seller_query(principal)?;

        let mut order = self
            .store
            .get_order(order_id)
            .await
            .map_err(|err| {
                tracing::error!(error = %err, %order_id, "store failure loading order");
                DomainError::Internal
            })?
            .ok_or(DomainError::NotFound {
                entity: "order",
                id: order_id.to_string(),
            })?;

        auth::update_order_status(principal, &order)?;

        order.set_status(new_status);
        order.touch(self.clock.now());
        self.store.save_order(order.clone()).await.map_err(|err| {
            tracing::error!(error = %err, %order_id, "store failure saving order");
            DomainError::Internal
        })?;

        tracing::info!(%order_id, status = %new_status, "order status updated");

        for seller_id in order.seller_ids() {
            let payload = serde_json::json!({
                "order_id": order.id(),
                "status": new_status,
            });
            let send =
                self.notifier
                    .notify(seller_id, NotificationKind::OrderStatusUpdated, payload);
            match tokio::time::timeout(self.notify_timeout, send).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(error = %err, %seller_id, %order_id, "status notification failed");
                }
                Err(_) => {
                    tracing::warn!(%seller_id, %order_id, "status notification timed out");
                }
            }
        }

        Ok(order)
    }
}
