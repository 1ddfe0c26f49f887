/// Data models for product-service
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Page size used when a caller does not ask for one
pub const DEFAULT_LIMIT: i64 = 20;
/// Largest page a caller may request
pub const MAX_LIMIT: i64 = 100;

/// A marketplace listing
///
/// `seller` is the subject of the identity that created the product and the
/// only predicate for update and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Price in minor units
    pub price: i64,
    pub seller: String,
}

/// Inclusive price bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl PriceRange {
    pub fn contains(&self, price: i64) -> bool {
        self.from.map_or(true, |from| price >= from) && self.to.map_or(true, |to| price <= to)
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindRequest {
    pub offset: i64,
    pub limit: i64,
    /// Exact name match
    pub name: Option<String>,
    pub price_range: Option<PriceRange>,
    pub seller: Option<String>,
}

impl Default for FindRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            name: None,
            price_range: None,
            seller: None,
        }
    }
}

impl FindRequest {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            offset,
            limit,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.offset < 0 {
            return Err(AppError::BadRequest(format!(
                "offset must not be negative, got {}",
                self.offset
            )));
        }
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {}, got {}",
                MAX_LIMIT, self.limit
            )));
        }
        if let Some(PriceRange {
            from: Some(from),
            to: Some(to),
        }) = self.price_range
        {
            if from > to {
                return Err(AppError::BadRequest(format!(
                    "price range is empty: {} > {}",
                    from, to
                )));
            }
        }
        Ok(())
    }

    /// Whether `product` passes every filter of the request
    pub fn matches(&self, product: &Product) -> bool {
        self.name.as_ref().map_or(true, |name| &product.name == name)
            && self
                .seller
                .as_ref()
                .map_or(true, |seller| &product.seller == seller)
            && self
                .price_range
                .map_or(true, |range| range.contains(product.price))
    }
}

/// Product creation request
///
/// A `seller` supplied by the client is accepted on the wire but always
/// replaced with the caller's subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub name: String,
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller: Option<String>,
}

impl CreateRequest {
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_price(self.price)
    }
}

/// Product as handed to storage, owner already stamped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub price: i64,
    pub seller: String,
}

/// Partial product update; only provided fields change
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRequest {
    pub id: String,
    pub name: Option<String>,
    pub price: Option<i64>,
}

impl UpdateRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        Ok(())
    }

    pub fn apply(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".to_string()));
    }
    Ok(())
}

fn validate_price(price: i64) -> Result<()> {
    if price < 0 {
        return Err(AppError::BadRequest(format!(
            "price must not be negative, got {}",
            price
        )));
    }
    Ok(())
}
