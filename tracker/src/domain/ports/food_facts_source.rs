//! Driven port for the product-metadata web service.
//!
//! Scanned barcodes are resolved into a display name and image so the insert
//! form can be pre-filled. One call per lookup; no retries.

use async_trait::async_trait;

use super::define_port_error;

/// Metadata returned for a barcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodFactsProduct {
    /// Barcode the lookup was made for.
    pub code: String,
    /// Product display name; may be empty when the service has none.
    pub name: String,
    /// Front image URL, or the product code when the service has no image.
    pub image_url: String,
}

define_port_error! {
    /// Errors surfaced while calling the food-facts service.
    pub enum FoodFactsSourceError {
        /// The service does not know the code.
        NotFound { code: String } =>
            "no food facts for code {code}",
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "food facts transport failed: {message}",
        /// Response could not be decoded.
        Decode { message: String } =>
            "food facts response decode failed: {message}",
    }
}

/// Port for barcode metadata lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FoodFactsSource: Send + Sync {
    /// Fetch metadata for `code`.
    async fn fetch(&self, code: &str) -> Result<FoodFactsProduct, FoodFactsSourceError>;
}

/// Fixture implementation that echoes the code with no name or image.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureFoodFactsSource;

#[async_trait]
impl FoodFactsSource for FixtureFoodFactsSource {
    async fn fetch(&self, code: &str) -> Result<FoodFactsProduct, FoodFactsSourceError> {
        Ok(FoodFactsProduct {
            code: code.to_owned(),
            name: String::new(),
            image_url: code.to_owned(),
        })
    }
}
