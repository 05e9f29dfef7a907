//! Remote price lookup.
//!
//! # Responsibilities
//! - Perform one `GET {base_url}/price/{id}` request
//! - Turn transport errors, non-2xx statuses and bad payloads into `PricingError`
//!
//! No retries or deadlines here; the resilient client owns those.

use async_trait::async_trait;
use serde::Deserialize;

use crate::inventory::ItemId;
use crate::pricing::types::PricingError;

/// A single remote "get price by id" operation.
#[async_trait]
pub trait PriceSource: Send + Sync + 'static {
    async fn fetch_price(&self, id: ItemId) -> Result<f64, PricingError>;
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    price: f64,
}

/// Pricing service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPriceSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPriceSource {
    /// Create a source for the pricing service at `base_url`.
    pub fn new(base_url: &str) -> Result<Self, PricingError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a source using a preconfigured HTTP client.
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Result<Self, PricingError> {
        let parsed: url::Url = base_url.parse().map_err(|e| {
            PricingError::Transport(format!("invalid pricing URL '{}': {}", base_url, e))
        })?;
        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn price_url(&self, id: ItemId) -> String {
        format!("{}/price/{}", self.base_url, id)
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    async fn fetch_price(&self, id: ItemId) -> Result<f64, PricingError> {
        let url = self.price_url(id);
        tracing::debug!(url = %url, item_id = %id, "Calling pricing service");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PricingError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PricingError::Status(status.as_u16()));
        }

        let body: PriceResponse = response
            .json()
            .await
            .map_err(|e| PricingError::Malformed(e.to_string()))?;

        if !body.price.is_finite() || body.price < 0.0 {
            return Err(PricingError::Malformed(format!("invalid price {}", body.price)));
        }

        tracing::debug!(item_id = %id, price = body.price, "Got price");
        Ok(body.price)
    }
}
