use actix::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::actors::{FailedReceipt, GenerateReceipt, GetFailedReceipts, ReceiptActor, RenderReceipt};
use crate::domain::access::Caller;
use crate::domain::cart::{Cart, CartError};
use crate::domain::order::{
    HandlerError, Order, OrderCommand, OrderCommandHandler, OrderError, OrderFilter, OrderNumber,
    OrderProjection, OrderStatus, PaymentMethod, PlaceOrder, ShippingAddress,
};
use crate::event_sourcing::StoreError;
use crate::metrics::Metrics;
use crate::receipts::{Receipt, ReceiptError};

// ============================================================================
// Order Service - Public Operations
// ============================================================================
//
// Every operation runs in the same order:
// 1. authorization (role of the caller)
// 2. input validation
// 3. load and decide (command handler, with conflict retries)
// 4. projection update, metrics, receipt trigger
//
// Steps 3 and the projection update run on their own task: once a command
// has started, its events and the read model move together even if the
// request that issued it is dropped.
//
// Customers only ever see their own orders; anything else is NotFound.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation { .. } => "validation",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::Authorization(_) => "authorization",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Infrastructure(_) => "internal",
        }
    }

    fn order_not_found(order_number: OrderNumber) -> Self {
        ServiceError::NotFound(format!("Order {} not found", order_number))
    }
}

impl From<OrderError> for ServiceError {
    fn from(error: OrderError) -> Self {
        match error.field() {
            Some(field) => ServiceError::Validation {
                field: field.to_string(),
                message: error.to_string(),
            },
            None => match error {
                OrderError::PaymentNotPending(_) | OrderError::InvalidStatusTransition { .. } => {
                    ServiceError::Conflict(error.to_string())
                }
                other => ServiceError::Infrastructure(anyhow::anyhow!("Corrupt order stream: {}", other)),
            },
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::VersionConflict { .. } => {
                ServiceError::Conflict("Order was modified concurrently, re-read and retry".to_string())
            }
            StoreError::Backend(e) => ServiceError::Infrastructure(e),
        }
    }
}

impl From<HandlerError> for ServiceError {
    fn from(error: HandlerError) -> Self {
        match error {
            HandlerError::Rejected(e) => e.into(),
            HandlerError::NotFound(n) => ServiceError::order_not_found(n),
            HandlerError::Store(e) => e.into(),
        }
    }
}

impl From<CartError> for ServiceError {
    fn from(error: CartError) -> Self {
        ServiceError::Validation {
            field: "items".to_string(),
            message: error.to_string(),
        }
    }
}

impl From<ReceiptError> for ServiceError {
    fn from(error: ReceiptError) -> Self {
        ServiceError::Infrastructure(anyhow::Error::new(error))
    }
}

impl From<MailboxError> for ServiceError {
    fn from(error: MailboxError) -> Self {
        ServiceError::Infrastructure(anyhow::anyhow!("Receipt actor unavailable: {}", error))
    }
}

pub struct OrderService {
    handler: Arc<OrderCommandHandler>,
    projection: Arc<OrderProjection>,
    receipts: Addr<ReceiptActor>,
    metrics: Arc<Metrics>,
}

impl OrderService {
    pub fn new(
        handler: OrderCommandHandler,
        projection: Arc<OrderProjection>,
        receipts: Addr<ReceiptActor>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            handler: Arc::new(handler),
            projection,
            receipts,
            metrics,
        }
    }

    pub async fn create_order(
        &self,
        caller: &Caller,
        cart: Cart,
        shipping_address: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<Order, ServiceError> {
        let started = Instant::now();
        let command = PlaceOrder {
            customer_id: caller.user_id,
            cart,
            shipping_address,
            payment_method,
        };

        let handler = self.handler.clone();
        let projection = self.projection.clone();
        let committed = tokio::spawn(async move {
            let order = handler.place(command, Uuid::new_v4()).await?;
            projection.upsert(&order).await;
            Ok::<_, HandlerError>(order)
        })
        .await;
        self.metrics.observe_command("place_order", started.elapsed().as_secs_f64());
        let order = committed.map_err(command_task_failed)??;

        self.metrics.record_order_placed(payment_label(payment_method));

        tracing::info!(
            order_number = %order.order_number,
            customer_id = %order.customer_id,
            total = %order.pricing.total(),
            payment_method = ?payment_method,
            "🛒 Order placed"
        );
        Ok(order)
    }

    pub async fn get_order(&self, caller: &Caller, order_number: OrderNumber) -> Result<Order, ServiceError> {
        let order = self
            .handler
            .load(order_number)
            .await?
            .ok_or_else(|| ServiceError::order_not_found(order_number))?;

        if !caller.role.can_view_all_orders() && !order.is_owned_by(caller.user_id) {
            return Err(ServiceError::order_not_found(order_number));
        }
        Ok(order)
    }

    /// Orders visible to the caller, newest first
    pub async fn list_orders(&self, caller: &Caller, filter: OrderFilter) -> Result<Vec<Order>, ServiceError> {
        let mut filter = filter;
        if !caller.role.can_view_all_orders() {
            filter.customer_id = Some(caller.user_id);
        }
        Ok(self.projection.list(&filter).await)
    }

    pub async fn confirm_payment(
        &self,
        caller: &Caller,
        order_number: OrderNumber,
        transaction_id: String,
        notes: Option<String>,
    ) -> Result<Order, ServiceError> {
        require_payment_role(caller)?;
        if transaction_id.trim().is_empty() {
            return Err(OrderError::BlankTransactionId.into());
        }

        let order = self
            .run(caller, order_number, OrderCommand::ConfirmPayment { transaction_id, notes })
            .await?;
        self.metrics.record_payment_transition("paid");

        tracing::info!(
            order_number = %order.order_number,
            staff_id = %caller.user_id,
            "💰 Payment confirmed"
        );

        self.receipts.do_send(GenerateReceipt { order: order.clone() });
        Ok(order)
    }

    pub async fn reject_payment(
        &self,
        caller: &Caller,
        order_number: OrderNumber,
        reason: String,
    ) -> Result<Order, ServiceError> {
        require_payment_role(caller)?;
        if reason.trim().is_empty() {
            return Err(OrderError::BlankRejectionReason.into());
        }

        let order = self
            .run(caller, order_number, OrderCommand::RejectPayment { reason })
            .await?;
        self.metrics.record_payment_transition("rejected");

        tracing::info!(
            order_number = %order.order_number,
            staff_id = %caller.user_id,
            "🚫 Payment rejected"
        );
        Ok(order)
    }

    pub async fn advance_order_status(
        &self,
        caller: &Caller,
        order_number: OrderNumber,
        target: OrderStatus,
    ) -> Result<Order, ServiceError> {
        if !caller.role.can_fulfill_orders() {
            return Err(ServiceError::Authorization(format!(
                "Role {} cannot change order status",
                caller.role
            )));
        }

        let order = self
            .run(caller, order_number, OrderCommand::AdvanceStatus { target })
            .await?;
        self.metrics.record_status_transition(target.as_str());

        tracing::info!(
            order_number = %order.order_number,
            status = ?order.status,
            actor = %caller.user_id,
            "📦 Order status changed"
        );
        Ok(order)
    }

    /// Receipt for an order the caller can see, rendered on demand if needed
    pub async fn receipt(&self, caller: &Caller, order_number: OrderNumber) -> Result<Receipt, ServiceError> {
        let order = self.get_order(caller, order_number).await?;
        let receipt = self.receipts.send(RenderReceipt { order }).await??;
        Ok(receipt)
    }

    /// Receipt jobs that exhausted their retries
    pub async fn failed_receipts(&self, caller: &Caller) -> Result<Vec<FailedReceipt>, ServiceError> {
        require_payment_role(caller)?;
        Ok(self.receipts.send(GetFailedReceipts).await?)
    }

    async fn run(
        &self,
        caller: &Caller,
        order_number: OrderNumber,
        command: OrderCommand,
    ) -> Result<Order, ServiceError> {
        let name = command.name();
        let started = Instant::now();

        let handler = self.handler.clone();
        let projection = self.projection.clone();
        let actor = caller.user_id;
        let committed = tokio::spawn(async move {
            let order = handler.execute(order_number, command, actor, Uuid::new_v4()).await?;
            projection.upsert(&order).await;
            Ok::<_, HandlerError>(order)
        })
        .await;
        self.metrics.observe_command(name, started.elapsed().as_secs_f64());

        match committed.map_err(command_task_failed)? {
            Ok(order) => Ok(order),
            Err(e) => {
                tracing::warn!(order_number = %order_number, command = name, error = %e, "Command refused");
                Err(e.into())
            }
        }
    }
}

fn command_task_failed(error: tokio::task::JoinError) -> ServiceError {
    ServiceError::Infrastructure(anyhow::anyhow!("Order command task failed: {}", error))
}

fn require_payment_role(caller: &Caller) -> Result<(), ServiceError> {
    if caller.role.can_settle_payments() {
        Ok(())
    } else {
        Err(ServiceError::Authorization(format!(
            "Role {} cannot settle payments",
            caller.role
        )))
    }
}

fn payment_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::CashOnDelivery => "cash_on_delivery",
        PaymentMethod::Bkash => "bkash",
        PaymentMethod::Nagad => "nagad",
        PaymentMethod::Card => "card",
    }
}
