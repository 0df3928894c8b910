//! Shared types for the leaderboard cache.
//!
//! These mirror the rows of the external `rates` and `winners` tables and
//! double as the JSON payloads served by the API.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Rates
// ---------------------------------------------------------------------------

/// Latest USD price of a ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub ticker: String,
    pub price: f64,
}

impl Rate {
    pub fn new(ticker: impl Into<String>, price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            price,
        }
    }
}

/// Price of `ticker` in `rates`. The first match wins when the
/// table carries duplicates.
pub fn find_price(rates: &[Rate], ticker: &str) -> Option<f64> {
    rates.iter().find(|r| r.ticker == ticker).map(|r| r.price)
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Aggregated leaderboard entry for one address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub address: String,
    /// Number of rounds won.
    pub rounds: i64,
    /// Total profit in USD, derived from the secondary amounts.
    pub profit_usd: f64,
    pub profit_eth: f64,
    pub profit_bnb: f64,
}

impl Score {
    /// Leaderboard order: most rounds first, then highest USD profit.
    pub fn rank_cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .rounds
            .cmp(&self.rounds)
            .then_with(|| other.profit_usd.total_cmp(&self.profit_usd))
    }
}

/// Whether `scores` is in leaderboard order.
pub fn is_ranked(scores: &[Score]) -> bool {
    scores
        .windows(2)
        .all(|w| w[0].rank_cmp(&w[1]) != std::cmp::Ordering::Greater)
}

// ---------------------------------------------------------------------------
// Secondary currencies
// ---------------------------------------------------------------------------

/// Currencies whose winnings are converted into `profit_usd`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecondaryCurrency {
    Eth,
    Bnb,
}

impl SecondaryCurrency {
    /// Conversion order. A row with both amounts positive ends up
    /// priced by the last currency in this list.
    pub const ALL: [SecondaryCurrency; 2] = [SecondaryCurrency::Eth, SecondaryCurrency::Bnb];

    /// Ticker in the `rates` table.
    pub fn ticker(&self) -> &'static str {
        match self {
            SecondaryCurrency::Eth => "eth",
            SecondaryCurrency::Bnb => "bnb",
        }
    }

    /// Amount column in the `winners` table.
    pub fn column(&self) -> &'static str {
        match self {
            SecondaryCurrency::Eth => "profit_eth",
            SecondaryCurrency::Bnb => "profit_bnb",
        }
    }
}

impl fmt::Display for SecondaryCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ticker())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
