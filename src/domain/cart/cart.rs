use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::catalog::ProductCatalog;
use crate::domain::pricing::Pricing;
use super::value_objects::{CartItem, ProductId};

// ============================================================================
// Cart Aggregator
// ============================================================================
//
// A shopper's cart is a plain value. Every transition consumes the cart and
// returns the next one; totals are derived on read so they can never drift
// from the lines.
//
// Quantity policy:
// - update_quantity(id, n) with n <= 0 removes the line
// - decrement(id) is relative and stops at 1; removal is explicit
// - updates to products not in the cart are no-ops
//
// Totals are checked arithmetic: a cart whose amounts do not fit in a
// Decimal has no subtotal and no pricing.
//
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CartError {
    #[error("Product not found in catalog: {0}")]
    UnknownProduct(ProductId),

    #[error("Invalid quantity {quantity} for {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: u32 },

    #[error("Invalid unit price {unit_price} for {product_id}")]
    InvalidPrice { product_id: ProductId, unit_price: Decimal },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: BTreeMap<ProductId, CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from submitted lines, merging repeated products.
    pub fn try_from_items(items: impl IntoIterator<Item = CartItem>) -> Result<Self, CartError> {
        items.into_iter().try_fold(Self::new(), |cart, item| {
            if item.quantity == 0 {
                return Err(CartError::InvalidQuantity {
                    product_id: item.product_id,
                    quantity: 0,
                });
            }
            if item.unit_price <= Decimal::ZERO {
                return Err(CartError::InvalidPrice {
                    product_id: item.product_id,
                    unit_price: item.unit_price,
                });
            }
            Ok(cart.add_item(item))
        })
    }

    /// Add a line. Adding a product already in the cart increases its
    /// quantity and keeps the price locked by the first add.
    pub fn add_item(mut self, item: CartItem) -> Self {
        if item.quantity == 0 {
            return self;
        }

        match self.items.get_mut(&item.product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => {
                self.items.insert(item.product_id.clone(), item);
            }
        }
        self
    }

    /// Look the product up in the catalog and add it at today's price
    pub fn add_from_catalog(
        self,
        catalog: &dyn ProductCatalog,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Self, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity {
                product_id: product_id.clone(),
                quantity,
            });
        }

        let product = catalog
            .product(product_id)
            .ok_or_else(|| CartError::UnknownProduct(product_id.clone()))?;

        if product.price <= Decimal::ZERO {
            return Err(CartError::InvalidPrice {
                product_id: product_id.clone(),
                unit_price: product.price,
            });
        }

        Ok(self.add_item(CartItem::from_catalog(&product, quantity)))
    }

    pub fn update_quantity(mut self, product_id: &ProductId, quantity: i64) -> Self {
        if quantity <= 0 {
            return self.remove_item(product_id);
        }

        if let Some(item) = self.items.get_mut(product_id) {
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
        self
    }

    pub fn increment(mut self, product_id: &ProductId) -> Self {
        if let Some(item) = self.items.get_mut(product_id) {
            item.quantity = item.quantity.saturating_add(1);
        }
        self
    }

    pub fn decrement(mut self, product_id: &ProductId) -> Self {
        if let Some(item) = self.items.get_mut(product_id) {
            item.quantity = item.quantity.saturating_sub(1).max(1);
        }
        self
    }

    pub fn remove_item(mut self, product_id: &ProductId) -> Self {
        self.items.remove(product_id);
        self
    }

    pub fn clear(self) -> Self {
        Self::new()
    }

    pub fn items(&self) -> impl Iterator<Item = &CartItem> {
        self.items.values()
    }

    pub fn get(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.get(product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct products
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities
    pub fn item_count(&self) -> u64 {
        self.items.values().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of line totals, `None` on overflow
    pub fn subtotal(&self) -> Option<Decimal> {
        self.items
            .values()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.line_total()?))
    }

    pub fn pricing(&self) -> Option<Pricing> {
        self.subtotal().map(Pricing::from_subtotal)
    }
}
