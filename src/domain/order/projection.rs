use futures_util::future::try_join_all;
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::event_sourcing::{load_aggregate, EventStore, StoreError};
use super::aggregate::Order;
use super::events::OrderEvent;
use super::value_objects::{OrderNumber, OrderStatus, PaymentStatus};

// ============================================================================
// Order Projection - Read Model for Listings
// ============================================================================
//
// Latest known state of every order, kept in memory for list queries.
// Updated after each successful write and rebuilt from the event store on
// startup. A write only replaces an entry with a higher version, so racing
// updates cannot roll an order back.
//
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip)]
    pub customer_id: Option<Uuid>,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        self.status.map_or(true, |s| order.status == s)
            && self.payment_status.map_or(true, |s| order.payment.status == s)
            && self.customer_id.map_or(true, |id| order.customer_id == id)
    }
}

#[derive(Default)]
pub struct OrderProjection {
    orders: RwLock<HashMap<OrderNumber, Order>>,
}

impl OrderProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, order: &Order) {
        let mut orders = self.orders.write().await;
        match orders.get(&order.order_number) {
            Some(existing) if existing.version >= order.version => {}
            _ => {
                orders.insert(order.order_number, order.clone());
            }
        }
    }

    pub async fn get(&self, order_number: &OrderNumber) -> Option<Order> {
        self.orders.read().await.get(order_number).cloned()
    }

    /// Matching orders, newest first
    pub async fn list(&self, filter: &OrderFilter) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect();

        orders.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.order_number.cmp(&a.order_number))
        });
        orders
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Replace the projection with a fresh fold of every stream in the store
    pub async fn rebuild(&self, store: &dyn EventStore<OrderEvent>) -> Result<usize, StoreError> {
        let ids = store.aggregate_ids().await?;
        let loaded = try_join_all(
            ids.into_iter()
                .map(|id| load_aggregate::<Order, OrderEvent>(store, id)),
        )
        .await?;

        let mut orders = self.orders.write().await;
        orders.clear();
        for order in loaded.into_iter().flatten() {
            orders.insert(order.order_number, order);
        }
        Ok(orders.len())
    }
}
