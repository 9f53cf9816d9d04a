//! Checkout orchestration: converts request lines into a persisted order
//! while keeping stock exact.
//!
//! The whole checkout is one unit of work. Stock draw-downs are staged in a
//! [`StockLedger`] and only reach the store inside a single
//! [`CheckoutCommit`], together with the new order and the cart clearing.
//! A concurrent stock change surfaces as a version conflict, which restarts
//! the read-validate-reserve cycle; no partial order and no partial stock
//! decrement can ever survive a failure.

use common::{OrderId, ProductId, UserId};
use domain::{DomainError, Order, OrderLine, PaymentMethod, Principal, auth};
use serde::{Deserialize, Serialize};
use store::{CheckoutCommit, MarketStore, StoreError};

use crate::clock::Clock;
use crate::config::Config;
use crate::inventory::StockLedger;
use crate::notify::{NotificationKind, NotificationSink};
use crate::ratelimit::RateLimitPolicy;

/// One requested line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A checkout request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub lines: Vec<OrderLineRequest>,
}

/// Drives order placement end to end.
pub struct CheckoutService<S, R, N, C>
where
    S: MarketStore,
    R: RateLimitPolicy,
    N: NotificationSink,
    C: Clock,
{
    store: S,
    limiter: R,
    notifier: N,
    clock: C,
    config: Config,
}

impl<S, R, N, C> CheckoutService<S, R, N, C>
where
    S: MarketStore,
    R: RateLimitPolicy,
    N: NotificationSink,
    C: Clock,
{
    /// Creates a new checkout service.
    pub fn new(store: S, limiter: R, notifier: N, clock: C, config: Config) -> Self {
        Self {
            store,
            limiter,
            notifier,
            clock,
            config,
        }
    }

    /// Places an order for the authenticated principal.
    ///
    /// Runs the full sequence: empty-order and role checks, rate limiting,
    /// per-line stock reservation at current prices, the atomic commit
    /// (order + stock + cart clearing), and a post-commit best-effort
    /// confirmation notification.
    #[tracing::instrument(skip(self, request), fields(user_id = %principal.user_id))]
    pub async fn place_order(
        &self,
        principal: &Principal,
        request: PlaceOrder,
    ) -> Result<Order, DomainError> {
        metrics::counter!("checkout_orders_total").increment(1);
        let started = std::time::Instant::now();

        let result = self.place_order_inner(principal, &request).await;
        metrics::histogram!("checkout_duration_seconds").record(started.elapsed().as_secs_f64());

        match result {
            Ok(order) => {
                tracing::info!(order_id = %order.id(), total = %order.total(), "order placed");
                self.send_confirmation(principal.user_id, &order).await;
                Ok(order)
            }
            Err(err) => {
                metrics::counter!("checkout_failed_total").increment(1);
                tracing::warn!(error = %err, "checkout rejected");
                Err(err)
            }
        }
    }

    async fn place_order_inner(
        &self,
        principal: &Principal,
        request: &PlaceOrder,
    ) -> Result<Order, DomainError> {
        if request.lines.is_empty() {
            return Err(DomainError::EmptyOrder);
        }
        auth::place_order(principal)?;
        if !self.limiter.try_acquire(principal.user_id) {
            return Err(DomainError::RateLimited);
        }
        if let Some(line) = request.lines.iter().find(|line| line.quantity == 0) {
            return Err(DomainError::Validation(format!(
                "quantity must be at least 1 for product {}",
                line.product_id
            )));
        }

        let mut attempts = 0;
        loop {
            attempts += 1;

            let mut ledger = StockLedger::new(&self.store);
            let mut lines = Vec::with_capacity(request.lines.len());
            for line in &request.lines {
                let reservation = ledger.reserve(line.product_id, line.quantity).await?;
                lines.push(OrderLine::new(
                    reservation.product_id,
                    reservation.seller_id,
                    reservation.quantity,
                    reservation.unit_price,
                ));
            }

            let order = Order::new(
                OrderId::new(),
                principal.user_id,
                lines,
                request.shipping_address.clone(),
                request.payment_method,
                self.clock.now(),
            )?;

            let clear_cart = self
                .store
                .get_cart(principal.user_id)
                .await
                .map_err(|err| {
                    tracing::error!(error = %err, user_id = %principal.user_id, "store failure loading cart");
                    DomainError::Internal
                })?
                .map(|cart| cart.id());

            let commit = CheckoutCommit {
                products: ledger.into_reserved(),
                order: order.clone(),
                clear_cart,
            };
            match self.store.commit_checkout(commit).await {
                Ok(()) => return Ok(order),
                Err(StoreError::VersionConflict { product_id, .. })
                    if attempts <= self.config.commit_retries =>
                {
                    tracing::debug!(%product_id, attempt = attempts, "checkout commit conflicted, retrying");
                }
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        user_id = %principal.user_id,
                        order_id = %order.id(),
                        "checkout commit failed"
                    );
                    return Err(DomainError::Internal);
                }
            }
        }
    }

    /// Best-effort order confirmation; bounded, logged, never propagated.
    async fn send_confirmation(&self, user_id: UserId, order: &Order) {
        let payload = serde_json::json!({
            "order_id": order.id(),
            "total_cents": order.total().cents(),
            "status": order.status(),
        });
        let send = self
            .notifier
            .notify(user_id, NotificationKind::OrderConfirmation, payload);
        match tokio::time::timeout(self.config.notify_timeout, send).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::warn!(error = %err, order_id = %order.id(), "order confirmation failed");
            }
            Err(_) => {
                tracing::warn!(order_id = %order.id(), "order confirmation timed out");
            }
        }
    }
}
