//! Catalog reference data.

use super::Quote;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// A trackable entity known to the remote source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Unique, case-sensitive ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
    /// Price around which quotes are generated.
    pub base_price: Decimal,
}

impl CatalogEntry {
    /// Create a new catalog entry.
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, base_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            base_price,
        }
    }
}

/// One row of the catalog listing: the entry and its current quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogListing {
    pub entry: CatalogEntry,
    pub quote: Quote,
}

/// Look up an entry by exact symbol.
pub fn find_entry<'a>(catalog: &'a [CatalogEntry], symbol: &str) -> Option<&'a CatalogEntry> {
    catalog.iter().find(|entry| entry.symbol == symbol)
}

/// The fixed catalog used when the remote catalog cannot be fetched.
pub fn reference_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("SWANSON", "Swanson Foods", dec!(45.50)),
        CatalogEntry::new("LITTLES", "Little Sebastian Memorial", dec!(120.00)),
        CatalogEntry::new("PAWN", "Pawn Shop", dec!(15.25)),
        CatalogEntry::new("RENT", "Rent-A-Swag", dec!(32.75)),
        CatalogEntry::new("TOMS", "Tom's Bistro", dec!(28.50)),
        CatalogEntry::new("JJ", "JJ's Diner", dec!(18.90)),
        CatalogEntry::new("PIT", "The Pit", dec!(22.30)),
        CatalogEntry::new("SWEET", "Sweetums", dec!(55.00)),
        CatalogEntry::new("GRIZ", "Gryzzl", dec!(95.75)),
        CatalogEntry::new("ENT", "Entertainment 720", dec!(0.05)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reference_catalog_shape() {
        let catalog = reference_catalog();
        assert_eq!(catalog.len(), 10);

        let symbols: HashSet<_> = catalog.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols.len(), 10);
        assert!(catalog.iter().all(|e| e.base_price > Decimal::ZERO));
    }

    #[test]
    fn test_find_entry_is_case_sensitive() {
        let catalog = reference_catalog();
        assert_eq!(
            find_entry(&catalog, "GRIZ").map(|e| e.name.as_str()),
            Some("Gryzzl")
        );
        assert!(find_entry(&catalog, "griz").is_none());
    }
}
