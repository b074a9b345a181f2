use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::catalog::CatalogProduct;

// ============================================================================
// Cart Value Objects
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One product line in a cart, with the price and display data read from the
/// catalog when it was added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    #[serde(default)]
    pub name_bn: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartItem {
    pub fn new(product_id: ProductId, name: impl Into<String>, unit_price: Decimal, quantity: u32) -> Self {
        Self {
            product_id,
            name: name.into(),
            name_bn: String::new(),
            unit_price,
            quantity,
            weight: String::new(),
            image: None,
        }
    }

    /// Lock the catalog's current price and display data into a cart line
    pub fn from_catalog(product: &CatalogProduct, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            name_bn: product.name_bn.clone(),
            unit_price: product.price,
            quantity,
            weight: product.weight.clone(),
            image: product.image.clone(),
        }
    }

    /// `unit_price × quantity`, or `None` when it does not fit in a Decimal
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}
