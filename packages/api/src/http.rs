//! `reqwest` implementation of [`PriceApi`].

use std::time::Duration;

use async_trait::async_trait;
use geojson::FeatureCollection;
use resale_map_api_models::{
    AddressPriceRow, BoundariesResponse, PricesResponse, PropertiesResponse, StreetPriceQuery,
    StreetPriceRow, TownPriceRow, decode_rows,
};
use resale_map_property_models::{AddressPrice, AggregatePricePoint, RawProperty};
use serde::de::DeserializeOwned;

use crate::{ApiError, PriceApi};

/// Talks to the backend over HTTP.
pub struct HttpPriceApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpPriceApi {
    /// Creates a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// * If the underlying HTTP client cannot be constructed
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// The backend root this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{endpoint}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &[(&'static str, String)],
    ) -> Result<T, ApiError> {
        let url = self.url(endpoint);
        log::debug!("GET {url} {query:?}");

        let resp = self.client.get(&url).query(query).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            log::warn!("{endpoint} returned {status}");
            return Err(ApiError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        serde_json::from_str(&body).map_err(|e| ApiError::Parse {
            endpoint,
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl PriceApi for HttpPriceApi {
    async fn properties(&self) -> Result<Vec<RawProperty>, ApiError> {
        let resp: PropertiesResponse = self.get_json("properties", &[]).await?;
        Ok(resp.properties)
    }

    async fn town_prices(&self) -> Result<Vec<AggregatePricePoint>, ApiError> {
        let resp: PricesResponse<TownPriceRow> = self.get_json("agg_prices", &[]).await?;
        Ok(decode_rows("agg_prices", resp.prices, TownPriceRow::into_point))
    }

    async fn boundaries(&self) -> Result<FeatureCollection, ApiError> {
        let resp: BoundariesResponse = self.get_json("geojson", &[]).await?;
        Ok(resp.geojson)
    }

    async fn address_prices(&self) -> Result<Vec<AddressPrice>, ApiError> {
        let resp: PricesResponse<AddressPriceRow> =
            self.get_json("agg_address_prices", &[]).await?;
        Ok(decode_rows(
            "agg_address_prices",
            resp.prices,
            AddressPriceRow::into_address_price,
        ))
    }

    async fn street_prices(
        &self,
        query: &StreetPriceQuery,
    ) -> Result<Vec<AggregatePricePoint>, ApiError> {
        let resp: PricesResponse<StreetPriceRow> =
            self.get_json("prices", &query.to_query_pairs()).await?;
        if let Some(message) = &resp.message {
            log::info!("prices: {message}");
        }
        Ok(decode_rows("prices", resp.prices, StreetPriceRow::into_point))
    }
}
