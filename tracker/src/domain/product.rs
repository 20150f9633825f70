//! Product data model.
//!
//! A product is one row of the grocery table: a named quantity of food with
//! an optional expiry date, sitting either at home or in the shopping cart.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::expiry_dates::parse_expiry_date;

/// Validation errors returned by product constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductValidationError {
    EmptyName,
    NegativeQuantity { value: i64 },
    QuantityTooLarge { value: i64 },
    InvalidExpiryDate { raw: String },
    InvalidId { value: i64 },
}

impl fmt::Display for ProductValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "product name must not be empty"),
            Self::NegativeQuantity { value } => {
                write!(f, "quantity must not be negative (got {value})")
            }
            Self::QuantityTooLarge { value } => {
                write!(f, "quantity must be at most {} (got {value})", Quantity::MAX)
            }
            Self::InvalidExpiryDate { raw } => {
                write!(f, "expiry date must be an ISO date (YYYY-MM-DD), got {raw:?}")
            }
            Self::InvalidId { value } => write!(f, "product id must be positive (got {value})"),
        }
    }
}

impl std::error::Error for ProductValidationError {}

/// Store-assigned product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    /// Validate a raw identifier; ids start at one.
    pub fn new(value: i64) -> Result<Self, ProductValidationError> {
        if value < 1 {
            return Err(ProductValidationError::InvalidId { value });
        }
        Ok(Self(value))
    }

    /// Raw integer value.
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-empty display name, trimmed of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductName(String);

impl ProductName {
    /// Validate and construct a [`ProductName`].
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ProductValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ProductValidationError::EmptyName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Borrow the name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for ProductName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProductName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ProductName> for String {
    fn from(value: ProductName) -> Self {
        value.0
    }
}

impl TryFrom<String> for ProductName {
    type Error = ProductValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Item count; never negative and small enough for an SQL `INTEGER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Largest storable quantity.
    pub const MAX: i64 = i32::MAX as i64;

    /// Validate a signed quantity.
    pub fn new(value: i64) -> Result<Self, ProductValidationError> {
        if value < 0 {
            return Err(ProductValidationError::NegativeQuantity { value });
        }
        if value > Self::MAX {
            return Err(ProductValidationError::QuantityTooLarge { value });
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| ProductValidationError::QuantityTooLarge { value })
    }

    /// Raw count.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which of the two lists a product belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListMembership {
    /// In the household; expiry reminders are active.
    AtHome,
    /// On the shopping list; no reminders.
    InCart,
}

impl ListMembership {
    /// Map the persisted `in_cart` flag.
    pub fn from_in_cart(in_cart: bool) -> Self {
        if in_cart { Self::InCart } else { Self::AtHome }
    }

    /// Persisted `in_cart` flag.
    pub fn is_in_cart(self) -> bool {
        matches!(self, Self::InCart)
    }
}

/// Mutable fields of a product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    /// Display name.
    pub name: ProductName,
    /// Item count.
    pub quantity: Quantity,
    /// Optional calendar expiry date.
    pub expiry_date: Option<NaiveDate>,
    /// `true` when the product sits on the shopping list.
    pub in_cart: bool,
}

impl ProductDetails {
    /// Validate raw form input.
    ///
    /// # Examples
    /// ```
    /// use food_tracker::domain::ProductDetails;
    ///
    /// let details = ProductDetails::parse("Soda", 3, Some("2025-06-30"), false)
    ///     .expect("valid product");
    /// assert_eq!(details.name.as_str(), "Soda");
    /// assert!(ProductDetails::parse("Soda", 3, Some("30/06"), false).is_err());
    /// ```
    pub fn parse(
        name: &str,
        quantity: i64,
        expiry_date: Option<&str>,
        in_cart: bool,
    ) -> Result<Self, ProductValidationError> {
        let expiry_date = match expiry_date {
            Some(raw) => parse_expiry_date(raw)?,
            None => None,
        };
        Ok(Self {
            name: ProductName::new(name)?,
            quantity: Quantity::new(quantity)?,
            expiry_date,
            in_cart,
        })
    }

    /// List the product belongs to.
    pub fn membership(&self) -> ListMembership {
        ListMembership::from_in_cart(self.in_cart)
    }
}

/// Insert request for the product store.
///
/// `id` is normally `None` so the store assigns the next identifier. Restore
/// and import paths may pin an explicit id; a collision is resolved by the
/// store's [`ConflictPolicy`](super::ConflictPolicy).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    /// Optional explicit identifier.
    pub id: Option<ProductId>,
    /// Field values.
    pub details: ProductDetails,
}

impl ProductDraft {
    /// Draft that lets the store assign the id.
    pub fn new(details: ProductDetails) -> Self {
        Self { id: None, details }
    }

    /// Draft pinned to an explicit id.
    pub fn with_id(id: ProductId, details: ProductDetails) -> Self {
        Self {
            id: Some(id),
            details,
        }
    }
}

/// Persisted product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    id: ProductId,
    #[serde(flatten)]
    details: ProductDetails,
}

impl Product {
    /// Combine an identifier with field values.
    pub fn new(id: ProductId, details: ProductDetails) -> Self {
        Self { id, details }
    }

    /// Store-assigned identifier.
    pub fn id(&self) -> ProductId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &ProductName {
        &self.details.name
    }

    /// Item count.
    pub fn quantity(&self) -> Quantity {
        self.details.quantity
    }

    /// Optional expiry date.
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.details.expiry_date
    }

    /// `true` when on the shopping list.
    pub fn in_cart(&self) -> bool {
        self.details.in_cart
    }

    /// List the product belongs to.
    pub fn membership(&self) -> ListMembership {
        self.details.membership()
    }

    /// Borrow all mutable fields.
    pub fn details(&self) -> &ProductDetails {
        &self.details
    }

    /// Copy of this row moved to `membership`.
    #[must_use]
    pub fn moved_to(&self, membership: ListMembership) -> Self {
        let mut moved = self.clone();
        moved.details.in_cart = membership.is_in_cart();
        moved
    }

    /// Copy of this row with replaced field values.
    #[must_use]
    pub fn with_details(&self, details: ProductDetails) -> Self {
        Self {
            id: self.id,
            details,
        }
    }
}
