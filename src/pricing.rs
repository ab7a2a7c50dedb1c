//! Quote generation around a base price.
//!
//! Shared by the in-process remote and by local fallback synthesis:
//!
//! - `price` is `base * (1 + u)` with `u` uniform in `[-0.05, 0.05)`;
//! - `change` is uniform in `[-5, 5)`;
//! - `change_percent` is uniform in `[-0.05, 0.05)`.
//!
//! All three are rounded to two decimal places. `change` and `change_percent`
//! are drawn independently of the price.

use crate::state::{CatalogEntry, Quote, QuoteMap, find_entry};
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Maximum relative price drift from the base price.
pub const PRICE_DRIFT: f64 = 0.05;
/// Half-width of the `change` range.
pub const CHANGE_SPREAD: f64 = 5.0;
/// Half-width of the `change_percent` range.
pub const CHANGE_PERCENT_SPREAD: f64 = 0.05;

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn uniform<R: Rng>(rng: &mut R, half_width: f64) -> Decimal {
    let drawn = rng.random_range(-half_width..half_width);
    Decimal::from_f64(drawn).unwrap_or_default()
}

/// Generate a price within `base * [0.95, 1.05)`.
pub fn generate_price<R: Rng>(base_price: Decimal, rng: &mut R) -> Decimal {
    round2(base_price * (Decimal::ONE + uniform(rng, PRICE_DRIFT)))
}

/// Generate a quote for a catalog entry.
pub fn generate_quote<R: Rng>(entry: &CatalogEntry, rng: &mut R) -> Quote {
    Quote {
        symbol: entry.symbol.clone(),
        name: entry.name.clone(),
        price: generate_price(entry.base_price, rng),
        change: round2(uniform(rng, CHANGE_SPREAD)),
        change_percent: round2(uniform(rng, CHANGE_PERCENT_SPREAD)),
    }
}

/// Synthesize quotes for `symbols` from catalog base prices.
///
/// Symbols absent from the catalog are omitted.
pub fn synthesize_quotes<R: Rng>(
    catalog: &[CatalogEntry],
    symbols: &[String],
    rng: &mut R,
) -> QuoteMap {
    symbols
        .iter()
        .filter_map(|symbol| find_entry(catalog, symbol))
        .map(|entry| (entry.symbol.clone(), generate_quote(entry, rng)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::reference_catalog;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_stays_within_drift() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let price = generate_price(dec!(45.50), &mut rng);
            // 45.50 * 0.95 = 43.225, 45.50 * 1.05 = 47.775
            assert!(price >= dec!(43.22) && price <= dec!(47.78), "{price}");
            assert!(price.scale() <= 2);
        }
    }

    #[test]
    fn test_change_ranges() {
        let mut rng = StdRng::seed_from_u64(11);
        let entry = CatalogEntry::new("GRIZ", "Gryzzl", dec!(95.75));
        for _ in 0..1_000 {
            let quote = generate_quote(&entry, &mut rng);
            assert!(quote.change >= dec!(-5) && quote.change <= dec!(5));
            assert!(quote.change_percent >= dec!(-0.05) && quote.change_percent <= dec!(0.05));
            assert_eq!(quote.symbol, "GRIZ");
            assert_eq!(quote.name, "Gryzzl");
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let entry = CatalogEntry::new("PAWN", "Pawn Shop", dec!(15.25));
        let a = generate_quote(&entry, &mut StdRng::seed_from_u64(3));
        let b = generate_quote(&entry, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_synthesize_omits_unknown_symbols() {
        let mut rng = StdRng::seed_from_u64(1);
        let symbols = vec!["SWANSON".to_string(), "BOGUS".to_string()];
        let quotes = synthesize_quotes(&reference_catalog(), &symbols, &mut rng);

        assert_eq!(quotes.len(), 1);
        assert!(quotes.contains_key("SWANSON"));
    }
}
