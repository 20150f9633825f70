//! DTOs for decoding Open Food Facts product responses.

use serde::Deserialize;

use crate::domain::ports::FoodFactsProduct;

#[derive(Debug, Deserialize)]
pub(super) struct ProductResponseDto {
    #[serde(default)]
    pub(super) code: Option<String>,
    #[serde(default)]
    pub(super) status: Option<i64>,
    #[serde(default)]
    pub(super) product: Option<ProductDto>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductDto {
    #[serde(default)]
    pub(super) product_name: Option<String>,
    #[serde(default)]
    pub(super) image_small_url: Option<String>,
    #[serde(default)]
    pub(super) image_front_small_url: Option<String>,
}

impl ProductResponseDto {
    /// Map into the domain record; `None` when the service reports no match.
    pub(super) fn into_domain(self, requested_code: &str) -> Option<FoodFactsProduct> {
        if self.status == Some(0) {
            return None;
        }
        let product = self.product?;
        let code = self
            .code
            .filter(|code| !code.trim().is_empty())
            .unwrap_or_else(|| requested_code.to_owned());
        let image_url = non_blank(product.image_small_url)
            .or_else(|| non_blank(product.image_front_small_url))
            .unwrap_or_else(|| code.clone());

        Some(FoodFactsProduct {
            name: product.product_name.unwrap_or_default().trim().to_owned(),
            image_url,
            code,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}
