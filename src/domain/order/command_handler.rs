use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;

use crate::event_sourcing::{load_aggregate, Aggregate, EventEnvelope, EventStore, StoreError};
use crate::metrics::Metrics;
use crate::utils::{retry_on_transient, IsTransient, RetryConfig};

use super::aggregate::Order;
use super::commands::{OrderCommand, PlaceOrder};
use super::errors::OrderError;
use super::events::OrderEvent;
use super::factory::place_order;
use super::value_objects::OrderNumber;

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Events → Event Store
//
// Every command is decided against a freshly loaded order and appended at the
// version it was loaded at. When another writer got there first the whole
// load/decide/append cycle is retried, so the precondition is always checked
// against the state the write actually lands on.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Rejected(#[from] OrderError),

    #[error("Order not found: {0}")]
    NotFound(OrderNumber),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IsTransient for HandlerError {
    fn is_transient(&self) -> bool {
        matches!(self, HandlerError::Store(e) if e.is_version_conflict())
    }
}

pub struct OrderCommandHandler {
    event_store: Arc<dyn EventStore<OrderEvent>>,
    retry: RetryConfig,
    metrics: Arc<Metrics>,
}

impl OrderCommandHandler {
    pub fn new(event_store: Arc<dyn EventStore<OrderEvent>>, metrics: Arc<Metrics>) -> Self {
        Self {
            event_store,
            retry: RetryConfig::for_conflicts(),
            metrics,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn event_store(&self) -> &dyn EventStore<OrderEvent> {
        self.event_store.as_ref()
    }

    /// Validate a checkout and start a new order stream
    pub async fn place(&self, command: PlaceOrder, correlation_id: Uuid) -> Result<Order, HandlerError> {
        let placed = place_order(&command, Utc::now())?;
        let aggregate_id = placed.order_number.as_uuid();

        let envelope = EventEnvelope::wrap(aggregate_id, 1, OrderEvent::Placed(placed), correlation_id)
            .with_user(command.customer_id);
        let order = Order::apply_first_event(&envelope)?;

        self.event_store.append_events(aggregate_id, 0, vec![envelope]).await?;

        tracing::debug!(order_number = %order.order_number, "Order stream created");
        Ok(order)
    }

    pub async fn load(&self, order_number: OrderNumber) -> Result<Option<Order>, StoreError> {
        load_aggregate::<Order, OrderEvent>(self.event_store.as_ref(), order_number.as_uuid()).await
    }

    /// Run a command against an existing order, retrying on version conflicts
    pub async fn execute(
        &self,
        order_number: OrderNumber,
        command: OrderCommand,
        actor: Uuid,
        correlation_id: Uuid,
    ) -> Result<Order, HandlerError> {
        let name = command.name();
        let command = &command;

        let result = retry_on_transient(self.retry.clone(), move |attempt| {
            if attempt > 1 {
                self.metrics.record_conflict_retry(name);
            }
            self.try_execute(order_number, command, actor, correlation_id)
        })
        .await
        .into_result();

        if let Err(HandlerError::Store(e)) = &result {
            if e.is_version_conflict() {
                self.metrics.record_conflict(name);
            }
        }
        result
    }

    async fn try_execute(
        &self,
        order_number: OrderNumber,
        command: &OrderCommand,
        actor: Uuid,
        correlation_id: Uuid,
    ) -> Result<Order, HandlerError> {
        let mut order = self
            .load(order_number)
            .await?
            .ok_or(HandlerError::NotFound(order_number))?;

        let expected_version = order.version();
        let events = order.handle_command(command)?;

        let mut envelopes = Vec::with_capacity(events.len());
        for event in events {
            let envelope = EventEnvelope::wrap(order.aggregate_id(), order.version() + 1, event, correlation_id)
                .with_user(actor);
            order.apply_event(&envelope)?;
            envelopes.push(envelope);
        }

        self.event_store
            .append_events(order.aggregate_id(), expected_version, envelopes)
            .await?;

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::{Cart, CartItem, ProductId};
    use crate::domain::order::value_objects::{OrderStatus, PaymentMethod, PaymentStatus, ShippingAddress};
    use crate::event_sourcing::testing::InterleavedStore;
    use crate::event_sourcing::InMemoryEventStore;
    use rust_decimal::Decimal;

    fn handler() -> OrderCommandHandler {
        let store: Arc<dyn EventStore<OrderEvent>> = Arc::new(InMemoryEventStore::new());
        OrderCommandHandler::new(store, Arc::new(Metrics::new().unwrap()))
    }

    fn checkout() -> PlaceOrder {
        PlaceOrder {
            customer_id: Uuid::new_v4(),
            cart: Cart::new().add_item(CartItem::new(ProductId::new("mango"), "Mango", Decimal::from(120), 2)),
            shipping_address: ShippingAddress {
                full_name: "Tania Akter".to_string(),
                phone: "01511000000".to_string(),
                address_line: "12 Mirpur Road".to_string(),
                city: "Dhaka".to_string(),
                area: "Mirpur".to_string(),
                instructions: None,
            },
            payment_method: PaymentMethod::Bkash,
        }
    }

    #[tokio::test]
    async fn test_place_then_load() {
        let handler = handler();
        let order = handler.place(checkout(), Uuid::new_v4()).await.unwrap();

        let loaded = handler.load(order.order_number).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
        assert_eq!(loaded.pricing, order.pricing);
        assert_eq!(handler.event_store().current_version(order.aggregate_id()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_invalid_checkout_writes_nothing() {
        let handler = handler();
        let mut command = checkout();
        command.cart = Cart::new();

        let err = handler.place(command, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, HandlerError::Rejected(OrderError::EmptyCart)));
        assert!(handler.event_store().aggregate_ids().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let handler = handler();
        let err = handler
            .execute(
                OrderNumber::generate(),
                OrderCommand::AdvanceStatus { target: OrderStatus::Confirmed },
                Uuid::new_v4(),
                Uuid::new_v4(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rejected_command_is_not_retried() {
        let handler = handler();
        let order = handler.place(checkout(), Uuid::new_v4()).await.unwrap();

        let err = handler
            .execute(
                order.order_number,
                OrderCommand::AdvanceStatus { target: OrderStatus::Delivered },
                Uuid::new_v4(),
                Uuid::new_v4(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Rejected(OrderError::InvalidStatusTransition { .. })));
        assert_eq!(handler.load(order.order_number).await.unwrap().unwrap().version, 1);
    }

    fn racing_handler(retry: RetryConfig) -> (Arc<InterleavedStore<OrderEvent>>, Arc<Metrics>, OrderCommandHandler) {
        let store = Arc::new(InterleavedStore::<OrderEvent>::new(2));
        let metrics = Arc::new(Metrics::new().unwrap());
        let handler = OrderCommandHandler::new(store.clone(), metrics.clone()).with_retry(retry);
        (store, metrics, handler)
    }

    fn confirm(transaction_id: &str) -> OrderCommand {
        OrderCommand::ConfirmPayment { transaction_id: transaction_id.to_string(), notes: None }
    }

    #[tokio::test]
    async fn test_conflicting_writer_reloads_and_both_land() {
        let (store, metrics, handler) = racing_handler(RetryConfig::for_conflicts());
        let number = handler.place(checkout(), Uuid::new_v4()).await.unwrap().order_number;
        store.arm();

        let (confirmed, advanced) = tokio::join!(
            handler.execute(number, confirm("TXN42"), Uuid::new_v4(), Uuid::new_v4()),
            handler.execute(
                number,
                OrderCommand::AdvanceStatus { target: OrderStatus::Confirmed },
                Uuid::new_v4(),
                Uuid::new_v4(),
            ),
        );
        confirmed.unwrap();
        advanced.unwrap();

        let retries: u64 = ["confirm_payment", "advance_status"]
            .into_iter()
            .map(|name| metrics.command_retries.with_label_values(&[name]).get())
            .sum();
        assert_eq!(retries, 1);

        let order = handler.load(number).await.unwrap().unwrap();
        assert_eq!(order.version, 3);
        assert_eq!(order.payment.status, PaymentStatus::Paid);
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.timeline.len(), 3);
    }

    #[tokio::test]
    async fn test_double_confirm_has_exactly_one_winner() {
        let (store, metrics, handler) = racing_handler(RetryConfig::for_conflicts());
        let number = handler.place(checkout(), Uuid::new_v4()).await.unwrap().order_number;
        store.arm();

        let (a, b) = tokio::join!(
            handler.execute(number, confirm("TXN1"), Uuid::new_v4(), Uuid::new_v4()),
            handler.execute(number, confirm("TXN2"), Uuid::new_v4(), Uuid::new_v4()),
        );

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        // The loser re-decided against the paid order rather than failing on the version
        assert!(outcomes.iter().any(|r| matches!(
            r,
            Err(HandlerError::Rejected(OrderError::PaymentNotPending(PaymentStatus::Paid)))
        )));
        assert_eq!(metrics.command_retries.with_label_values(&["confirm_payment"]).get(), 1);
        assert_eq!(metrics.command_conflicts.with_label_values(&["confirm_payment"]).get(), 0);
        assert_eq!(handler.load(number).await.unwrap().unwrap().version, 2);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_the_version_conflict() {
        let no_retry = RetryConfig { max_attempts: 1, ..RetryConfig::for_conflicts() };
        let (store, metrics, handler) = racing_handler(no_retry);
        let number = handler.place(checkout(), Uuid::new_v4()).await.unwrap().order_number;
        store.arm();

        let (a, b) = tokio::join!(
            handler.execute(number, confirm("TXN7"), Uuid::new_v4(), Uuid::new_v4()),
            handler.execute(
                number,
                OrderCommand::AdvanceStatus { target: OrderStatus::Confirmed },
                Uuid::new_v4(),
                Uuid::new_v4(),
            ),
        );

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(HandlerError::Store(e)) if e.is_version_conflict())));

        let conflicts: u64 = ["confirm_payment", "advance_status"]
            .into_iter()
            .map(|name| metrics.command_conflicts.with_label_values(&[name]).get())
            .sum();
        assert_eq!(conflicts, 1);
        assert_eq!(handler.load(number).await.unwrap().unwrap().version, 2);
    }
}
