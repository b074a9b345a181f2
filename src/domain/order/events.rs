use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::pricing::Pricing;
use crate::event_sourcing::DomainEvent;
use super::value_objects::{OrderItem, OrderNumber, OrderStatus, PaymentMethod, ShippingAddress};

// ============================================================================
// Order Events - Domain Events for Order Aggregate
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Placed(OrderPlaced),
    PaymentConfirmed(PaymentConfirmed),
    PaymentRejected(PaymentRejected),
    StatusChanged(OrderStatusChanged),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Placed(_) => "OrderPlaced",
            OrderEvent::PaymentConfirmed(_) => "PaymentConfirmed",
            OrderEvent::PaymentRejected(_) => "PaymentRejected",
            OrderEvent::StatusChanged(_) => "OrderStatusChanged",
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Order Placed - first event of every order stream. Items and pricing are
/// frozen here and never change afterwards.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderPlaced {
    pub order_number: OrderNumber,
    pub customer_id: Uuid,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub pricing: Pricing,
    pub payment_method: PaymentMethod,
    pub placed_at: DateTime<Utc>,
}

/// Payment Confirmed - staff verified the transaction reference
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaymentConfirmed {
    pub transaction_id: String,
    pub notes: Option<String>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PaymentRejected {
    pub reason: String,
    pub rejected_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OrderStatusChanged {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub changed_at: DateTime<Utc>,
}
