use uuid::Uuid;

use crate::domain::cart::Cart;
use super::value_objects::{OrderStatus, PaymentMethod, ShippingAddress};

// ============================================================================
// Order Commands - Intent to Change Order State
// ============================================================================

/// Checkout request. Handled by the order factory, not by an existing
/// aggregate.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub customer_id: Uuid,
    pub cart: Cart,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone)]
pub enum OrderCommand {
    ConfirmPayment {
        transaction_id: String,
        notes: Option<String>,
    },

    RejectPayment {
        reason: String,
    },

    AdvanceStatus {
        target: OrderStatus,
    },
}

impl OrderCommand {
    /// Short label used in logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            OrderCommand::ConfirmPayment { .. } => "confirm_payment",
            OrderCommand::RejectPayment { .. } => "reject_payment",
            OrderCommand::AdvanceStatus { .. } => "advance_status",
        }
    }
}
