//! Store gateway.
//!
//! Defines the `Store` trait the refresh loop talks to and provides the
//! MySQL implementation backed by the external `rates` and `winners` tables.

pub mod mysql;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::{Rate, Score};

pub use mysql::MySqlStore;

/// Abstraction over the relational store holding rates and winners.
///
/// Calls are issued serially by a single refresh task; implementations
/// need no internal coordination beyond `Send + Sync`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Read every row of the `rates` table.
    async fn read_rates(&self) -> Result<Vec<Rate>, StoreError>;

    /// Rewrite `winners.profit_usd` from the secondary amounts using the
    /// prices in `rates`. One independent statement per currency, in
    /// [`SecondaryCurrency::ALL`](crate::types::SecondaryCurrency::ALL) order,
    /// each touching only rows whose amount is positive.
    async fn apply_derived_profit(&self, rates: &[Rate]) -> Result<(), StoreError>;

    /// Per-address aggregate of `winners`, ordered by rounds then USD profit,
    /// both descending.
    async fn read_aggregated_scores(&self) -> Result<Vec<Score>, StoreError>;
}
