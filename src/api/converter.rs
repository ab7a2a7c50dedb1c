//! Data conversion utilities for API responses.

use crate::error::Error;
use crate::state::{CatalogEntry, CatalogListing, Quote};
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A catalog row as sent by the remote service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireListing {
    pub symbol: String,
    pub name: String,
    pub price: Decimal,
    pub change: Decimal,
    pub change_percent: Decimal,
    #[serde(default)]
    pub base_price: Option<Decimal>,
}

/// Body of a `POST /tracked-stocks` request.
#[derive(Debug, Serialize)]
pub(crate) struct TrackRequest<'a> {
    pub symbol: &'a str,
}

/// Body of a successful `DELETE /tracked-stocks/:symbol`.
#[derive(Debug, Deserialize)]
pub(crate) struct RemovedResponse {
    pub removed: String,
}

/// Body of a non-2xx response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// Converts API responses to internal state types.
pub struct DataConverter;

impl DataConverter {
    /// Convert a catalog row. Rows without a base price use their listed
    /// price as the base.
    pub(crate) fn convert_listing(row: WireListing) -> CatalogListing {
        let base_price = row.base_price.unwrap_or(row.price);
        CatalogListing {
            entry: CatalogEntry::new(row.symbol.clone(), row.name.clone(), base_price),
            quote: Quote {
                symbol: row.symbol,
                name: row.name,
                price: row.price,
                change: row.change,
                change_percent: row.change_percent,
            },
        }
    }

    /// Convert a non-2xx response body into a rejection.
    pub fn convert_rejection(status: StatusCode, body: &str) -> Error {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| {
                status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Status {}", status.as_u16()))
            });
        Error::rejected(status.as_u16(), message)
    }
}
