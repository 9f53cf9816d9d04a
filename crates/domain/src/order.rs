//! Order aggregate, line items, and the order status machine.

use chrono::{DateTime, Utc};
use common::{Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// The status of an order in its lifecycle.
///
/// The expected path is:
/// ```text
/// Pending ──► Processing ──► Shipped ──► Delivered
///     │            │             │
///     └────────────┴─────────────┴──► Cancelled / Returned
/// ```
///
/// Transitions are authorized per seller but otherwise unconstrained: a
/// seller may move an order to any status in one step. Known gap, kept on
/// purpose; [`OrderStatus::is_terminal`] is informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order has been placed and awaits the seller.
    Pending,

    /// Seller is preparing the order.
    Processing,

    /// Order has been handed to the carrier.
    Shipped,

    /// Order reached the buyer (terminal).
    Delivered,

    /// Order was cancelled (terminal).
    Cancelled,

    /// Order was sent back by the buyer (terminal).
    Returned,
}

impl OrderStatus {
    /// Returns true if no further transitions are modeled from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Returned
        )
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Returned => "Returned",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the buyer intends to pay. Recorded on the order, never settled here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    CashOnDelivery,
    BankTransfer,
}

/// A purchased line item.
///
/// The product reference is read-only: later changes to the product's price,
/// availability, or ownership do not affect this line. Both the unit price
/// and the seller are frozen at the moment of purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// The purchased product.
    pub product_id: ProductId,

    /// Seller who owned the product at purchase time.
    pub seller_id: UserId,

    /// Units purchased, always at least 1.
    pub quantity: u32,

    /// Unit price captured at the moment of purchase, never recomputed.
    pub price_at_purchase: Money,
}

impl OrderLine {
    /// Creates a new order line.
    pub fn new(
        product_id: ProductId,
        seller_id: UserId,
        quantity: u32,
        price_at_purchase: Money,
    ) -> Self {
        Self {
            product_id,
            seller_id,
            quantity,
            price_at_purchase,
        }
    }

    /// Returns `price_at_purchase * quantity`.
    pub fn subtotal(&self) -> Money {
        self.price_at_purchase.multiply(self.quantity)
    }
}

/// A placed order.
///
/// The total always equals the sum of the line subtotals: it is computed at
/// construction and the line set is immutable afterwards. Cancellation is a
/// status change, never a line removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    user_id: UserId,
    lines: Vec<OrderLine>,
    total: Money,
    status: OrderStatus,
    shipping_address: String,
    payment_method: PaymentMethod,
    order_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Builds a `Pending` order from its lines, computing the total.
    ///
    /// Fails `EmptyOrder` without lines, and `Validation` on a blank
    /// shipping address or a zero-quantity line.
    pub fn new(
        id: OrderId,
        user_id: UserId,
        lines: Vec<OrderLine>,
        shipping_address: impl Into<String>,
        payment_method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if lines.is_empty() {
            return Err(DomainError::EmptyOrder);
        }
        let shipping_address = shipping_address.into();
        if shipping_address.trim().is_empty() {
            return Err(DomainError::Validation(
                "shipping address must not be blank".to_string(),
            ));
        }
        if lines.iter().any(|line| line.quantity == 0) {
            return Err(DomainError::Validation(
                "order line quantity must be at least 1".to_string(),
            ));
        }

        let total = lines.iter().map(OrderLine::subtotal).sum();

        Ok(Self {
            id,
            user_id,
            lines,
            total,
            status: OrderStatus::Pending,
            shipping_address,
            payment_method,
            order_date: now,
            created_at: now,
            updated_at: now,
        })
    }

    /// Returns the order ID.
    pub fn id(&self) -> OrderId {
        self.id
    }

    /// Returns the purchasing user's ID.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the purchased lines.
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    /// Returns the frozen order total.
    pub fn total(&self) -> Money {
        self.total
    }

    /// Returns the current status.
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Returns the shipping address.
    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }

    /// Returns the recorded payment method.
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Returns when the order was placed.
    pub fn order_date(&self) -> DateTime<Utc> {
        self.order_date
    }

    /// Returns the creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last-update timestamp.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns true if at least one line belongs to the given seller.
    pub fn contains_seller(&self, seller_id: UserId) -> bool {
        self.lines.iter().any(|line| line.seller_id == seller_id)
    }

    /// Returns the distinct sellers with lines in this order.
    pub fn seller_ids(&self) -> Vec<UserId> {
        let mut sellers: Vec<UserId> = self.lines.iter().map(|line| line.seller_id).collect();
        sellers.sort_by_key(UserId::as_uuid);
        sellers.dedup();
        sellers
    }

    /// Sets the status. Authorization is the caller's concern; the
    /// transition itself is unconstrained (see [`OrderStatus`]).
    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
    }

    /// Refreshes the last-update timestamp.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
