use rust_decimal::Decimal;

use crate::domain::cart::ProductId;
use super::value_objects::{OrderStatus, PaymentStatus};

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Shipping address field '{0}' is required")]
    MissingField(&'static str),

    #[error("Invalid quantity {quantity} for {product_id}")]
    InvalidItemQuantity { product_id: ProductId, quantity: u32 },

    #[error("Invalid unit price {unit_price} for {product_id}")]
    InvalidItemPrice { product_id: ProductId, unit_price: Decimal },

    #[error("Order amount is too large")]
    AmountOverflow,

    #[error("Transaction id is required to confirm a payment")]
    BlankTransactionId,

    #[error("A reason is required to reject a payment")]
    BlankRejectionReason,

    #[error("Payment is already {0}")]
    PaymentNotPending(PaymentStatus),

    #[error("Cannot move order from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("Order stream must start with an OrderPlaced event")]
    NotInitialized,

    #[error("Order has already been placed")]
    AlreadyPlaced,
}

impl OrderError {
    /// Input problems the caller can fix, as opposed to state conflicts
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OrderError::EmptyCart
                | OrderError::MissingField(_)
                | OrderError::InvalidItemQuantity { .. }
                | OrderError::InvalidItemPrice { .. }
                | OrderError::AmountOverflow
                | OrderError::BlankTransactionId
                | OrderError::BlankRejectionReason
        )
    }

    /// Name of the offending input, when there is one
    pub fn field(&self) -> Option<&'static str> {
        match self {
            OrderError::EmptyCart
            | OrderError::InvalidItemQuantity { .. }
            | OrderError::InvalidItemPrice { .. }
            | OrderError::AmountOverflow => Some("items"),
            OrderError::MissingField(field) => Some(field),
            OrderError::BlankTransactionId => Some("transaction_id"),
            OrderError::BlankRejectionReason => Some("reason"),
            _ => None,
        }
    }
}
