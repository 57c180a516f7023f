#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Request and response types for the resale map backend.
//!
//! The backend serves five endpoints:
//!
//! | Endpoint | Payload |
//! |---|---|
//! | `GET /api/properties` | `{"properties": [RawProperty]}` |
//! | `GET /api/agg_prices` | `{"prices": [TownPriceRow]}` |
//! | `GET /api/geojson` | `{"geojson": FeatureCollection}` |
//! | `GET /api/agg_address_prices` | `{"prices": [AddressPriceRow]}` |
//! | `GET /api/prices?towns=..&start_date=..&end_date=..` | `{"prices": [StreetPriceRow]}` |
//!
//! The price endpoints serialize their rows with a dataframe encoder, so the
//! `prices` field is usually a *string* containing a JSON array. Both forms
//! are accepted. Price values are decoded leniently into [`Price`].

use geojson::FeatureCollection;
use resale_map_aggregate::period::{parse_series_date, quarter_end};
use resale_map_property_models::{
    AddressPrice, AggregatePricePoint, FlatType, Price, RawProperty, YearMonth,
};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};

/// `GET /api/properties`
#[derive(Debug, Clone, Deserialize)]
pub struct PropertiesResponse {
    /// Every development.
    pub properties: Vec<RawProperty>,
}

/// `GET /api/geojson`
#[derive(Debug, Clone, Deserialize)]
pub struct BoundariesResponse {
    /// Planning-area polygons.
    pub geojson: FeatureCollection,
}

/// Any of the price endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct PricesResponse<T> {
    /// Decoded rows.
    #[serde(deserialize_with = "embedded_rows")]
    pub prices: Vec<T>,
    /// Informational message, e.g. when no data matched.
    #[serde(default)]
    pub message: Option<String>,
}

/// Accepts either a JSON array or a string containing one.
fn embedded_rows<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    #[derive(Deserialize)]
    #[serde(untagged, bound(deserialize = "T: DeserializeOwned"))]
    enum Embedded<T> {
        Rows(Vec<T>),
        Encoded(String),
    }

    match Embedded::<T>::deserialize(deserializer)? {
        Embedded::Rows(rows) => Ok(rows),
        Embedded::Encoded(text) => serde_json::from_str(&text).map_err(de::Error::custom),
    }
}

/// One row of the town-level quarterly series.
#[derive(Debug, Clone, Deserialize)]
pub struct TownPriceRow {
    /// Quarter label, e.g. `"2024-Q3"`.
    pub quarter: String,
    /// Town name.
    pub town: String,
    /// Flat type label.
    pub flat_type: String,
    /// Median price; often missing for rare flat types.
    #[serde(default)]
    pub price: Price,
}

impl TownPriceRow {
    /// Converts to a series point. Rows with an unknown quarter or flat type
    /// yield `None`.
    #[must_use]
    pub fn into_point(self) -> Option<AggregatePricePoint> {
        Some(AggregatePricePoint {
            date: quarter_end(&self.quarter)?,
            flat_type: parse_flat_type(&self.flat_type)?,
            group: self.town,
            price: self.price,
        })
    }
}

/// One row of the current street-level price snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressPriceRow {
    /// `"<block> <street>"`.
    pub block_street: String,
    /// Flat type label.
    pub flat_type: String,
    /// Median price.
    #[serde(default)]
    pub price: Price,
}

impl AddressPriceRow {
    /// Converts to a lookup entry. Unknown flat types yield `None`.
    #[must_use]
    pub fn into_address_price(self) -> Option<AddressPrice> {
        Some(AddressPrice {
            flat_type: parse_flat_type(&self.flat_type)?,
            block_street: self.block_street,
            price: self.price,
        })
    }
}

/// One row of the street-level price history.
#[derive(Debug, Clone, Deserialize)]
pub struct StreetPriceRow {
    /// Month of the aggregate.
    pub date: String,
    /// Street name.
    pub street: String,
    /// Flat type label.
    pub flat_type: String,
    /// Median price.
    #[serde(default)]
    pub price: Price,
}

impl StreetPriceRow {
    /// Converts to a series point. Rows with an unparseable date or unknown
    /// flat type yield `None`.
    #[must_use]
    pub fn into_point(self) -> Option<AggregatePricePoint> {
        Some(AggregatePricePoint {
            date: parse_series_date(&self.date)?,
            flat_type: parse_flat_type(&self.flat_type)?,
            group: self.street,
            price: self.price,
        })
    }
}

/// Converts rows with `convert`, logging how many were dropped.
pub fn decode_rows<R, T>(endpoint: &str, rows: Vec<R>, convert: impl Fn(R) -> Option<T>) -> Vec<T> {
    let total = rows.len();
    let decoded: Vec<T> = rows.into_iter().filter_map(convert).collect();
    if decoded.len() < total {
        log::warn!(
            "{endpoint}: dropped {} of {total} rows with unknown period or flat type",
            total - decoded.len()
        );
    }
    decoded
}

fn parse_flat_type(label: &str) -> Option<FlatType> {
    label.trim().to_uppercase().parse().ok()
}

/// Query for `GET /api/prices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreetPriceQuery {
    /// Towns to include.
    pub towns: Vec<String>,
    /// First month, inclusive.
    pub start: YearMonth,
    /// Last month, inclusive.
    pub end: YearMonth,
}

impl StreetPriceQuery {
    /// Query-string pairs in the form the backend expects.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("towns", self.towns.join(",")),
            ("start_date", self.start.to_string()),
            ("end_date", self.end.to_string()),
        ]
    }
}
