//! Write-side services for the marketplace engine.
//!
//! This crate drives every state change the engine makes:
//! - [`CheckoutService`] converts request lines into a persisted order while
//!   keeping stock exact (the all-or-nothing checkout unit of work)
//! - [`StockLedger`] stages per-product stock reservations for one checkout
//! - [`CartService`] mutates per-user carts with merge-on-add semantics
//! - [`OrderStatusService`] applies seller-driven status transitions
//! - [`SlidingWindowLimiter`] bounds order-placement frequency per user
//! - [`NotificationSink`] is the best-effort notification seam

pub mod cart;
pub mod clock;
pub mod config;
pub mod inventory;
pub mod notify;
pub mod orchestrator;
pub mod ratelimit;
pub mod status;

pub use cart::CartService;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use inventory::{Reservation, StockLedger};
pub use notify::{InMemoryNotifier, NotificationKind, NotificationSink, NotifyError};
pub use orchestrator::{CheckoutService, OrderLineRequest, PlaceOrder};
pub use ratelimit::{RateLimitPolicy, SlidingWindowLimiter, Unlimited};
pub use status::OrderStatusService;
