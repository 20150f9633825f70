//! Listing queries and their ordering rules.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::product::Product;

/// One of the three product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductQuery {
    /// Every product; dated first by ascending date, undated last.
    All,
    /// `in_cart = false`; ascending expiry date, undated last.
    AtHome,
    /// `in_cart = true`; ascending by name.
    InCart,
}

impl ProductQuery {
    /// Whether `product` belongs in this listing.
    pub fn matches(self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::AtHome => !product.in_cart(),
            Self::InCart => product.in_cart(),
        }
    }

    /// Total order for this listing; ties fall back to ascending id.
    pub fn compare(self, left: &Product, right: &Product) -> Ordering {
        let primary = match self {
            Self::All | Self::AtHome => compare_expiry(left, right),
            Self::InCart => left.name().as_str().cmp(right.name().as_str()),
        };
        primary.then_with(|| left.id().cmp(&right.id()))
    }

    /// Filter and order an unordered set of rows.
    pub fn apply<I>(self, products: I) -> Vec<Product>
    where
        I: IntoIterator<Item = Product>,
    {
        let mut listed: Vec<Product> = products
            .into_iter()
            .filter(|product| self.matches(product))
            .collect();
        listed.sort_by(|left, right| self.compare(left, right));
        listed
    }
}

fn compare_expiry(left: &Product, right: &Product) -> Ordering {
    match (left.expiry_date(), right.expiry_date()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
