use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

use super::cart::ProductId;

// ============================================================================
// Product Catalog - External Collaborator
// ============================================================================
//
// Catalog storage and search live outside this crate. The order core only
// reads a product's current price and display data at cart-add time.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub name_bn: String,
    pub price: Decimal,
    pub weight: String,
    pub image: Option<String>,
}

pub trait ProductCatalog: Send + Sync {
    fn product(&self, id: &ProductId) -> Option<CatalogProduct>;
}

/// Catalog held in memory; used by the demo binary and by tests that change
/// prices after an order is placed.
#[derive(Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, CatalogProduct>>,
}

impl InMemoryCatalog {
    pub fn new(products: impl IntoIterator<Item = CatalogProduct>) -> Self {
        let products = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            products: RwLock::new(products),
        }
    }

    /// Change a product's live price. Returns false for unknown products.
    pub fn set_price(&self, id: &ProductId, price: Decimal) -> bool {
        let mut products = match self.products.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match products.get_mut(id) {
            Some(product) => {
                product.price = price;
                true
            }
            None => false,
        }
    }
}

impl ProductCatalog for InMemoryCatalog {
    fn product(&self, id: &ProductId) -> Option<CatalogProduct> {
        let products = match self.products.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        products.get(id).cloned()
    }
}
