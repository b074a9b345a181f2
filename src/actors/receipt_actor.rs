use actix::prelude::*;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::domain::order::{Order, OrderNumber};
use crate::metrics::Metrics;
use crate::receipts::{Receipt, ReceiptError, ReceiptGenerator};
use crate::utils::{retry_on_transient, RetryConfig, RetryResult};

// ============================================================================
// Receipt Actor
// ============================================================================
//
// Owns receipt generation so that settling a payment never waits on the
// document renderer:
// - GenerateReceipt is fire-and-forget, retried with backoff
// - jobs that still fail land in an in-memory dead letter list
// - RenderReceipt serves the archived copy or renders one on demand
//
// Both the archive and the dead letters are bounded. The oldest archived
// order is evicted first (it is re-rendered on demand if asked for again);
// the oldest dead letter is dropped first.
//
// ============================================================================

const DEFAULT_ARCHIVE_CAPACITY: usize = 10_000;
const DEFAULT_DEAD_LETTER_CAPACITY: usize = 1_000;

pub struct ReceiptActor {
    generator: Arc<dyn ReceiptGenerator>,
    retry: RetryConfig,
    metrics: Arc<Metrics>,
    archive: HashMap<OrderNumber, Receipt>,
    /// Archived order numbers, oldest first
    archive_order: VecDeque<OrderNumber>,
    archive_capacity: usize,
    dead_letters: VecDeque<FailedReceipt>,
    dead_letter_capacity: usize,
}

impl ReceiptActor {
    pub fn new(generator: Arc<dyn ReceiptGenerator>, retry: RetryConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            generator,
            retry,
            metrics,
            archive: HashMap::new(),
            archive_order: VecDeque::new(),
            archive_capacity: DEFAULT_ARCHIVE_CAPACITY,
            dead_letters: VecDeque::new(),
            dead_letter_capacity: DEFAULT_DEAD_LETTER_CAPACITY,
        }
    }

    pub fn with_capacity(mut self, archive: usize, dead_letters: usize) -> Self {
        self.archive_capacity = archive.max(1);
        self.dead_letter_capacity = dead_letters.max(1);
        self
    }

    /// Keep the receipt unless a newer one is already archived
    fn archive(&mut self, receipt: Receipt) {
        let order_number = receipt.order_number;
        match self.archive.get(&order_number) {
            Some(existing) if existing.order_version > receipt.order_version => {}
            Some(_) => {
                self.archive.insert(order_number, receipt);
            }
            None => {
                self.archive.insert(order_number, receipt);
                self.archive_order.push_back(order_number);
                while self.archive_order.len() > self.archive_capacity {
                    if let Some(evicted) = self.archive_order.pop_front() {
                        self.archive.remove(&evicted);
                        tracing::debug!(order_number = %evicted, "Receipt evicted from archive");
                    }
                }
            }
        }
    }

    fn dead_letter(&mut self, failed: FailedReceipt) {
        if self.dead_letters.len() >= self.dead_letter_capacity {
            if let Some(dropped) = self.dead_letters.pop_front() {
                tracing::warn!(
                    order_number = %dropped.order_number,
                    "Dead letter list full, dropping oldest failed receipt"
                );
            }
        }
        self.dead_letters.push_back(failed);
    }
}

impl Actor for ReceiptActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("🧾 ReceiptActor started");
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct GenerateReceipt {
    pub order: Order,
}

#[derive(Message, Debug, Clone)]
#[rtype(result = "Result<Receipt, ReceiptError>")]
pub struct RenderReceipt {
    pub order: Order,
}

/// Archived receipt, if one has been generated
#[derive(Message, Debug, Clone)]
#[rtype(result = "Option<Receipt>")]
pub struct GetReceipt {
    pub order_number: OrderNumber,
}

#[derive(Message)]
#[rtype(result = "Vec<FailedReceipt>")]
pub struct GetFailedReceipts;

#[derive(Debug, Clone, Serialize)]
pub struct FailedReceipt {
    pub order_number: OrderNumber,
    pub order_version: i64,
    pub error: String,
    /// The renderer refused the order outright instead of timing out
    pub permanent: bool,
    pub failed_at: DateTime<Utc>,
}

// ============================================================================
// Handlers
// ============================================================================

impl Handler<GenerateReceipt> for ReceiptActor {
    type Result = ResponseActFuture<Self, ()>;

    fn handle(&mut self, msg: GenerateReceipt, _: &mut Self::Context) -> Self::Result {
        let generator = self.generator.clone();
        let retry = self.retry.clone();
        let order_number = msg.order.order_number;
        let order_version = msg.order.version;

        tracing::debug!(order_number = %order_number, "Receipt job queued");

        let job = async move {
            let generator = &generator;
            let order = &msg.order;
            retry_on_transient(retry, move |_attempt| generator.generate(order)).await
        };

        Box::pin(job.into_actor(self).map(move |result, act, _ctx| match result {
            RetryResult::Success(receipt) => {
                tracing::info!(order_number = %order_number, "🧾 Receipt generated");
                act.metrics.record_receipt_generated();
                act.archive(receipt);
            }
            RetryResult::Failed(e) | RetryResult::PermanentFailure(e) => {
                tracing::error!(
                    order_number = %order_number,
                    error = %e,
                    "💀 Receipt generation failed, moving job to dead letters"
                );
                act.metrics.record_receipt_dead_lettered();
                act.dead_letter(FailedReceipt {
                    order_number,
                    order_version,
                    permanent: matches!(e, ReceiptError::Rejected(_)),
                    error: e.to_string(),
                    failed_at: Utc::now(),
                });
            }
        }))
    }
}

impl Handler<RenderReceipt> for ReceiptActor {
    type Result = ResponseActFuture<Self, Result<Receipt, ReceiptError>>;

    fn handle(&mut self, msg: RenderReceipt, _: &mut Self::Context) -> Self::Result {
        let archived = self
            .archive
            .get(&msg.order.order_number)
            .filter(|receipt| receipt.order_version >= msg.order.version)
            .cloned();

        if let Some(receipt) = archived {
            return Box::pin(async move { Ok::<_, ReceiptError>(receipt) }.into_actor(self));
        }

        let generator = self.generator.clone();
        let render = async move { generator.generate(&msg.order).await };

        Box::pin(render.into_actor(self).map(|result, act, _ctx| {
            if let Ok(receipt) = &result {
                act.metrics.record_receipt_generated();
                act.archive(receipt.clone());
            }
            result
        }))
    }
}

impl Handler<GetReceipt> for ReceiptActor {
    type Result = MessageResult<GetReceipt>;

    fn handle(&mut self, msg: GetReceipt, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.archive.get(&msg.order_number).cloned())
    }
}

impl Handler<GetFailedReceipts> for ReceiptActor {
    type Result = MessageResult<GetFailedReceipts>;

    fn handle(&mut self, _msg: GetFailedReceipts, _: &mut Self::Context) -> Self::Result {
        MessageResult(self.dead_letters.iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::{Cart, CartItem, ProductId};
    use crate::domain::order::{OrderCommandHandler, OrderEvent, PaymentMethod, PlaceOrder, ShippingAddress};
    use crate::event_sourcing::{EventStore, InMemoryEventStore};
    use crate::receipts::TextReceiptGenerator;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    /// Fails with the given error for the first `failures` calls
    struct FlakyGenerator {
        calls: AtomicU32,
        failures: u32,
        error: ReceiptError,
    }

    impl FlakyGenerator {
        fn new(failures: u32, error: ReceiptError) -> Arc<Self> {
            Arc::new(Self { calls: AtomicU32::new(0), failures, error })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReceiptGenerator for FlakyGenerator {
        async fn generate(&self, order: &Order) -> Result<Receipt, ReceiptError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(self.error.clone());
            }
            TextReceiptGenerator::default().generate(order).await
        }
    }

    fn fast_retry(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        }
    }

    async fn sample_order() -> Order {
        let store: Arc<dyn EventStore<OrderEvent>> = Arc::new(InMemoryEventStore::new());
        let handler = OrderCommandHandler::new(store, Arc::new(Metrics::new().unwrap()));
        handler
            .place(
                PlaceOrder {
                    customer_id: Uuid::new_v4(),
                    cart: Cart::new().add_item(CartItem::new(ProductId::new("guava"), "Guava", Decimal::from(90), 3)),
                    shipping_address: ShippingAddress {
                        full_name: "Farhana Rahman".to_string(),
                        phone: "01711222333".to_string(),
                        address_line: "7 College Road".to_string(),
                        city: "Khulna".to_string(),
                        area: "Sonadanga".to_string(),
                        instructions: None,
                    },
                    payment_method: PaymentMethod::Bkash,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap()
    }

    async fn archived(addr: &Addr<ReceiptActor>, order_number: OrderNumber) -> Receipt {
        for _ in 0..200 {
            if let Some(receipt) = addr.send(GetReceipt { order_number }).await.unwrap() {
                return receipt;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("receipt for {} never archived", order_number);
    }

    async fn dead_letters(addr: &Addr<ReceiptActor>) -> Vec<FailedReceipt> {
        for _ in 0..200 {
            let failed = addr.send(GetFailedReceipts).await.unwrap();
            if !failed.is_empty() {
                return failed;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no receipt job reached the dead letters");
    }

    #[actix::test]
    async fn test_transient_failures_are_retried_and_archived() {
        let generator = FlakyGenerator::new(2, ReceiptError::Unavailable("timeout".to_string()));
        let addr = ReceiptActor::new(generator.clone(), fast_retry(5), Arc::new(Metrics::new().unwrap())).start();
        let order = sample_order().await;

        addr.do_send(GenerateReceipt { order: order.clone() });
        let archived = archived(&addr, order.order_number).await;
        assert_eq!(generator.calls(), 3);

        // Served from the archive without calling the renderer again
        let receipt = addr.send(RenderReceipt { order: order.clone() }).await.unwrap().unwrap();
        assert_eq!(receipt, archived);
        assert_eq!(generator.calls(), 3);
        assert!(addr.send(GetFailedReceipts).await.unwrap().is_empty());
    }

    #[actix::test]
    async fn test_exhausted_retries_go_to_dead_letters() {
        let generator = FlakyGenerator::new(u32::MAX, ReceiptError::Unavailable("renderer down".to_string()));
        let addr = ReceiptActor::new(generator.clone(), fast_retry(3), Arc::new(Metrics::new().unwrap())).start();
        let order = sample_order().await;

        addr.do_send(GenerateReceipt { order: order.clone() });

        let failed = dead_letters(&addr).await;
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].order_number, order.order_number);
        assert!(!failed[0].permanent);
        assert_eq!(generator.calls(), 3);
    }

    #[actix::test]
    async fn test_permanent_failure_is_not_retried() {
        let generator = FlakyGenerator::new(u32::MAX, ReceiptError::Rejected("bad template".to_string()));
        let addr = ReceiptActor::new(generator.clone(), fast_retry(5), Arc::new(Metrics::new().unwrap())).start();

        addr.do_send(GenerateReceipt { order: sample_order().await });

        let failed = dead_letters(&addr).await;
        assert_eq!(failed.len(), 1);
        assert!(failed[0].permanent);
        assert_eq!(generator.calls(), 1);
    }

    #[actix::test]
    async fn test_render_on_demand() {
        let generator = FlakyGenerator::new(0, ReceiptError::Unavailable(String::new()));
        let addr = ReceiptActor::new(generator.clone(), fast_retry(1), Arc::new(Metrics::new().unwrap())).start();
        let order = sample_order().await;

        let first = addr.send(RenderReceipt { order: order.clone() }).await.unwrap().unwrap();
        let second = addr.send(RenderReceipt { order }).await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(generator.calls(), 1);
    }

    #[actix::test]
    async fn test_archive_evicts_oldest_order() {
        let generator = FlakyGenerator::new(0, ReceiptError::Unavailable(String::new()));
        let addr = ReceiptActor::new(generator.clone(), fast_retry(1), Arc::new(Metrics::new().unwrap()))
            .with_capacity(1, 1)
            .start();
        let first = sample_order().await;
        let second = sample_order().await;

        addr.send(RenderReceipt { order: first.clone() }).await.unwrap().unwrap();
        addr.send(RenderReceipt { order: second.clone() }).await.unwrap().unwrap();

        assert!(addr.send(GetReceipt { order_number: first.order_number }).await.unwrap().is_none());
        assert!(addr.send(GetReceipt { order_number: second.order_number }).await.unwrap().is_some());

        // An evicted receipt is rendered again on request
        addr.send(RenderReceipt { order: first }).await.unwrap().unwrap();
        assert_eq!(generator.calls(), 3);
    }

    #[actix::test]
    async fn test_dead_letter_list_is_bounded() {
        let generator = FlakyGenerator::new(u32::MAX, ReceiptError::Rejected("bad template".to_string()));
        let metrics = Arc::new(Metrics::new().unwrap());
        let addr = ReceiptActor::new(generator, fast_retry(1), metrics.clone())
            .with_capacity(10, 2)
            .start();

        for _ in 0..3 {
            addr.do_send(GenerateReceipt { order: sample_order().await });
        }
        for _ in 0..200 {
            if metrics.receipts_dead_lettered.get() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert_eq!(metrics.receipts_dead_lettered.get(), 3);
        assert_eq!(addr.send(GetFailedReceipts).await.unwrap().len(), 2);
    }
}
