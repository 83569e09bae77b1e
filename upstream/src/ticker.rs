//! Native currency to USD conversion rate.

use serde::{Deserialize, Deserializer};
use url::Url;

use crate::client::{Method, decode};
use crate::{FetchError, UpstreamClient};

const TICKER_ENDPOINT: &str = "ticker";

#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(deserialize_with = "price_from_str")]
    price: f64,
}

fn price_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let price: f64 = raw.trim().parse().map_err(serde::de::Error::custom)?;
    if price.is_finite() && price >= 0.0 {
        Ok(price)
    } else {
        Err(serde::de::Error::custom(format!("invalid price {raw:?}")))
    }
}

/// Reads a `{"price": "<decimal>"}` ticker from a fixed URL.
#[derive(Debug, Clone)]
pub struct PriceTicker {
    http: reqwest::Client,
    url: Url,
}

impl PriceTicker {
    #[must_use]
    pub fn new(http: reqwest::Client, url: Url) -> Self {
        Self { http, url }
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Current XLM price in USD.
    pub async fn xlm_usd(&self) -> Result<f64, FetchError> {
        let client = UpstreamClient::new(self.http.clone(), self.url.clone());
        let body = client
            .fetch(TICKER_ENDPOINT, Method::Get, self.url.clone(), &[])
            .await?;
        let ticker: TickerResponse = decode(TICKER_ENDPOINT, &body)?;
        tracing::debug!(price = ticker.price, "Fetched XLM/USD price");
        Ok(ticker.price)
    }
}
