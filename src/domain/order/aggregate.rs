use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::pricing::Pricing;
use crate::event_sourcing::{Aggregate, EventEnvelope};
use super::commands::OrderCommand;
use super::errors::OrderError;
use super::events::*;
use super::timeline::{Timeline, TimelineStatus};
use super::value_objects::{
    non_blank, OrderItem, OrderNumber, OrderStatus, PaymentInfo, PaymentStatus, ShippingAddress,
};

// ============================================================================
// Order Aggregate - Domain Logic
// ============================================================================
//
// Two independent state machines live on one order:
// - payment:     pending → paid | rejected
// - fulfillment: pending → confirmed → processing → shipped → delivered,
//                any non-terminal status → cancelled
//
// Neither machine looks at the other. Items and pricing are fixed by the
// OrderPlaced event; the timeline is only ever appended to.
//
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    // Identity
    pub order_number: OrderNumber,
    pub customer_id: Uuid,
    pub version: i64,

    // Frozen at checkout
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub pricing: Pricing,

    // Current State (derived from events)
    pub payment: PaymentInfo,
    pub status: OrderStatus,
    pub timeline: Timeline,

    // Audit Trail
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Time for the next event, never earlier than the last one applied
    fn next_timestamp(&self) -> DateTime<Utc> {
        Utc::now().max(self.updated_at)
    }

    fn touch(&mut self, envelope: &EventEnvelope<OrderEvent>, at: DateTime<Utc>) {
        self.version = envelope.sequence_number;
        self.updated_at = self.updated_at.max(at);
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.customer_id == user_id
    }
}

// ============================================================================
// Aggregate Trait Implementation
// ============================================================================

impl Aggregate for Order {
    type Event = OrderEvent;
    type Command = OrderCommand;
    type Error = OrderError;

    fn apply_first_event(envelope: &EventEnvelope<OrderEvent>) -> Result<Self, OrderError> {
        let OrderEvent::Placed(e) = &envelope.event_data else {
            return Err(OrderError::NotInitialized);
        };

        let mut timeline = Timeline::default();
        timeline.push(
            TimelineStatus::Pending,
            OrderStatus::Pending.timeline_message(),
            e.placed_at,
            envelope.user_id,
        );

        Ok(Self {
            order_number: e.order_number,
            customer_id: e.customer_id,
            version: envelope.sequence_number,
            items: e.items.clone(),
            shipping_address: e.shipping_address.clone(),
            pricing: e.pricing,
            payment: PaymentInfo::submitted(e.payment_method, e.placed_at),
            status: OrderStatus::Pending,
            timeline,
            created_at: e.placed_at,
            updated_at: e.placed_at,
        })
    }

    fn apply_event(&mut self, envelope: &EventEnvelope<OrderEvent>) -> Result<(), OrderError> {
        let actor = envelope.user_id;

        match &envelope.event_data {
            OrderEvent::Placed(_) => Err(OrderError::AlreadyPlaced),
            OrderEvent::PaymentConfirmed(e) => {
                self.payment.status = PaymentStatus::Paid;
                self.payment.transaction_id = Some(e.transaction_id.clone());
                self.payment.notes = e.notes.clone();
                self.payment.paid_at = Some(e.paid_at);
                self.payment.settled_by = actor;
                self.timeline.push(TimelineStatus::Paid, "Payment confirmed", e.paid_at, actor);
                self.touch(envelope, e.paid_at);
                Ok(())
            }
            OrderEvent::PaymentRejected(e) => {
                self.payment.status = PaymentStatus::Rejected;
                self.payment.notes = Some(e.reason.clone());
                self.payment.settled_by = actor;
                self.timeline.push(TimelineStatus::Rejected, e.reason.clone(), e.rejected_at, actor);
                self.touch(envelope, e.rejected_at);
                Ok(())
            }
            OrderEvent::StatusChanged(e) => {
                self.status = e.to;
                self.timeline.push(e.to.into(), e.to.timeline_message(), e.changed_at, actor);
                self.touch(envelope, e.changed_at);
                Ok(())
            }
        }
    }

    fn handle_command(&self, command: &OrderCommand) -> Result<Vec<OrderEvent>, OrderError> {
        match command {
            OrderCommand::ConfirmPayment { transaction_id, notes } => {
                let transaction_id = transaction_id.trim();
                if transaction_id.is_empty() {
                    return Err(OrderError::BlankTransactionId);
                }
                if !self.payment.status.can_transition_to(PaymentStatus::Paid) {
                    return Err(OrderError::PaymentNotPending(self.payment.status));
                }

                Ok(vec![OrderEvent::PaymentConfirmed(PaymentConfirmed {
                    transaction_id: transaction_id.to_string(),
                    notes: non_blank(notes.as_deref()),
                    paid_at: self.next_timestamp(),
                })])
            }

            OrderCommand::RejectPayment { reason } => {
                let reason = reason.trim();
                if reason.is_empty() {
                    return Err(OrderError::BlankRejectionReason);
                }
                if !self.payment.status.can_transition_to(PaymentStatus::Rejected) {
                    return Err(OrderError::PaymentNotPending(self.payment.status));
                }

                Ok(vec![OrderEvent::PaymentRejected(PaymentRejected {
                    reason: reason.to_string(),
                    rejected_at: self.next_timestamp(),
                })])
            }

            OrderCommand::AdvanceStatus { target } => {
                if !self.status.can_transition_to(*target) {
                    return Err(OrderError::InvalidStatusTransition {
                        from: self.status,
                        to: *target,
                    });
                }

                Ok(vec![OrderEvent::StatusChanged(OrderStatusChanged {
                    from: self.status,
                    to: *target,
                    changed_at: self.next_timestamp(),
                })])
            }
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.order_number.as_uuid()
    }

    fn version(&self) -> i64 {
        self.version
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
