//! Reqwest-backed food-facts source adapter.
//!
//! This adapter owns transport details only: URL construction, timeout and
//! HTTP error mapping, and JSON decoding into the domain record.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use super::dto::ProductResponseDto;
use crate::domain::ports::{FoodFactsProduct, FoodFactsSource, FoodFactsSourceError};

const DEFAULT_USER_AGENT: &str = "food-tracker/0.1";

/// Food-facts adapter issuing one GET per lookup against a base URL.
pub struct FoodFactsHttpSource {
    client: Client,
    base_url: Url,
}

impl FoodFactsHttpSource {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self { client, base_url })
    }

    fn product_url(&self, code: &str) -> Result<Url, FoodFactsSourceError> {
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(FoodFactsSourceError::not_found(code));
        }
        let file_name = format!("{code}.json");
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FoodFactsSourceError::transport("base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["api", "v2", "product", file_name.as_str()]);
        Ok(url)
    }
}

#[async_trait]
impl FoodFactsSource for FoodFactsHttpSource {
    async fn fetch(&self, code: &str) -> Result<FoodFactsProduct, FoodFactsSourceError> {
        let url = self.product_url(code)?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if status == StatusCode::NOT_FOUND {
            return Err(FoodFactsSourceError::not_found(code));
        }
        if !status.is_success() {
            return Err(FoodFactsSourceError::transport(format!(
                "status {}",
                status.as_u16()
            )));
        }

        parse_product(body.as_ref(), code)
    }
}

fn parse_product(body: &[u8], code: &str) -> Result<FoodFactsProduct, FoodFactsSourceError> {
    let decoded: ProductResponseDto = serde_json::from_slice(body).map_err(|error| {
        FoodFactsSourceError::decode(format!("invalid food facts JSON payload: {error}"))
    })?;
    decoded
        .into_domain(code)
        .ok_or_else(|| FoodFactsSourceError::not_found(code))
}

fn map_transport_error(error: reqwest::Error) -> FoodFactsSourceError {
    FoodFactsSourceError::transport(error.to_string())
}
