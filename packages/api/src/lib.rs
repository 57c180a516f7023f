#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Backend access for the resale map dashboard.
//!
//! [`PriceApi`] is the seam between the dashboard and the five backend
//! endpoints. [`http::HttpPriceApi`] implements it over `reqwest`; tests
//! and the replay tool substitute in-memory implementations.
//!
//! [`load_initial`] joins the four startup endpoints. Any single failure
//! fails the whole load so a partially populated dashboard is never
//! rendered.

pub mod http;

use async_trait::async_trait;
use geojson::FeatureCollection;
use resale_map_api_models::StreetPriceQuery;
use resale_map_property_models::{AddressPrice, AggregatePricePoint, RawProperty};
use thiserror::Error;

pub use http::HttpPriceApi;

/// Errors from talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("{endpoint} returned status {status}")]
    Status {
        /// Endpoint path, e.g. `"agg_prices"`.
        endpoint: &'static str,
        /// HTTP status code.
        status: u16,
    },

    /// The body could not be decoded.
    #[error("Failed to parse {endpoint} response: {message}")]
    Parse {
        /// Endpoint path.
        endpoint: &'static str,
        /// Decoder message.
        message: String,
    },
}

/// Backend operations consumed by the dashboard.
#[async_trait]
pub trait PriceApi: Send + Sync {
    /// Every development row.
    async fn properties(&self) -> Result<Vec<RawProperty>, ApiError>;

    /// Town-level quarterly price series for every flat type.
    async fn town_prices(&self) -> Result<Vec<AggregatePricePoint>, ApiError>;

    /// Town boundary polygons.
    async fn boundaries(&self) -> Result<FeatureCollection, ApiError>;

    /// Current street-level price snapshot keyed by block and street.
    async fn address_prices(&self) -> Result<Vec<AddressPrice>, ApiError>;

    /// Street-level monthly price history for a set of towns.
    async fn street_prices(
        &self,
        query: &StreetPriceQuery,
    ) -> Result<Vec<AggregatePricePoint>, ApiError>;
}

/// Everything the dashboard needs before its first render.
#[derive(Debug, Clone)]
pub struct InitialData {
    /// Development rows.
    pub properties: Vec<RawProperty>,
    /// Town-level price series.
    pub town_prices: Vec<AggregatePricePoint>,
    /// Town boundaries.
    pub boundaries: FeatureCollection,
    /// Street-level price snapshot.
    pub address_prices: Vec<AddressPrice>,
}

/// Fetches the four startup datasets concurrently.
///
/// # Errors
///
/// * Returns the first [`ApiError`] raised by any of the four requests.
///   Nothing is returned on partial success.
pub async fn load_initial(api: &dyn PriceApi) -> Result<InitialData, ApiError> {
    log::info!("Loading initial datasets");

    let (properties, town_prices, boundaries, address_prices) = futures::try_join!(
        api.properties(),
        api.town_prices(),
        api.boundaries(),
        api.address_prices(),
    )?;

    log::info!(
        "Loaded {} properties, {} town price points, {} boundaries, {} address prices",
        properties.len(),
        town_prices.len(),
        boundaries.features.len(),
        address_prices.len()
    );

    Ok(InitialData {
        properties,
        town_prices,
        boundaries,
        address_prices,
    })
}
