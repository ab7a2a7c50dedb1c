//! Quote snapshots.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Quotes keyed by symbol.
pub type QuoteMap = HashMap<String, Quote>;

/// A live quote for one symbol.
///
/// `change` and `change_percent` are generated independently of `price`, so
/// they may disagree with the movement between two consecutive quotes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Current price.
    pub price: Decimal,
    /// Absolute change.
    pub change: Decimal,
    /// Fractional change.
    pub change_percent: Decimal,
}

impl Quote {
    /// Direction of the reported change.
    pub fn trend(&self) -> Trend {
        if self.change > Decimal::ZERO {
            Trend::Up
        } else if self.change < Decimal::ZERO {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

/// Direction of a quote's reported change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "↗"),
            Self::Down => write!(f, "↘"),
            Self::Flat => write!(f, "→"),
        }
    }
}

/// Index a list of quotes by symbol. Later duplicates win.
pub fn index_quotes(quotes: impl IntoIterator<Item = Quote>) -> QuoteMap {
    quotes
        .into_iter()
        .map(|quote| (quote.symbol.clone(), quote))
        .collect()
}
