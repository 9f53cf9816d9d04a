//! Read-side projections for the marketplace engine.
//!
//! Nothing here mutates state: [`OrderQueries`] serves ownership-checked
//! order lookups and paginated listings, and [`SellerEarnings`] aggregates
//! a seller's takings over a time interval.

pub mod earnings;
pub mod orders;

pub use earnings::SellerEarnings;
pub use orders::OrderQueries;
