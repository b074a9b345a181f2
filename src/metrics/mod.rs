// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Checkout throughput by payment method
// - Payment and fulfillment transitions
// - Optimistic concurrency conflicts and retries
// - Receipt generation and dead letters
// - Command latency
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Order Lifecycle Metrics
    pub orders_placed: IntCounterVec,
    pub payment_transitions: IntCounterVec,
    pub status_transitions: IntCounterVec,

    // Concurrency Metrics
    pub command_conflicts: IntCounterVec,
    pub command_retries: IntCounterVec,
    pub command_duration: HistogramVec,

    // Receipt Metrics
    pub receipts_generated: IntCounter,
    pub receipts_dead_lettered: IntCounter,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Order Lifecycle Metrics
        let orders_placed = IntCounterVec::new(
            Opts::new("fruitmart_orders_placed_total", "Total orders placed"),
            &["payment_method"],
        )?;
        registry.register(Box::new(orders_placed.clone()))?;

        let payment_transitions = IntCounterVec::new(
            Opts::new("fruitmart_payment_transitions_total", "Payments settled, by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(payment_transitions.clone()))?;

        let status_transitions = IntCounterVec::new(
            Opts::new("fruitmart_status_transitions_total", "Fulfillment transitions, by target status"),
            &["status"],
        )?;
        registry.register(Box::new(status_transitions.clone()))?;

        // Concurrency Metrics
        let command_conflicts = IntCounterVec::new(
            Opts::new("fruitmart_command_conflicts_total", "Commands that gave up after version conflicts"),
            &["command"],
        )?;
        registry.register(Box::new(command_conflicts.clone()))?;

        let command_retries = IntCounterVec::new(
            Opts::new("fruitmart_command_retries_total", "Command attempts repeated after a version conflict"),
            &["command"],
        )?;
        registry.register(Box::new(command_retries.clone()))?;

        let command_duration = HistogramVec::new(
            HistogramOpts::new("fruitmart_command_duration_seconds", "Order command duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["command"],
        )?;
        registry.register(Box::new(command_duration.clone()))?;

        // Receipt Metrics
        let receipts_generated = IntCounter::new(
            "fruitmart_receipts_generated_total",
            "Total receipts generated",
        )?;
        registry.register(Box::new(receipts_generated.clone()))?;

        let receipts_dead_lettered = IntCounter::new(
            "fruitmart_receipts_dead_lettered_total",
            "Receipt jobs that failed permanently",
        )?;
        registry.register(Box::new(receipts_dead_lettered.clone()))?;

        Ok(Self {
            registry,
            orders_placed,
            payment_transitions,
            status_transitions,
            command_conflicts,
            command_retries,
            command_duration,
            receipts_generated,
            receipts_dead_lettered,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_order_placed(&self, payment_method: &str) {
        self.orders_placed.with_label_values(&[payment_method]).inc();
    }

    /// `outcome` is the payment status reached: paid or rejected
    pub fn record_payment_transition(&self, outcome: &str) {
        self.payment_transitions.with_label_values(&[outcome]).inc();
    }

    pub fn record_status_transition(&self, status: &str) {
        self.status_transitions.with_label_values(&[status]).inc();
    }

    pub fn record_conflict(&self, command: &str) {
        self.command_conflicts.with_label_values(&[command]).inc();
    }

    pub fn record_conflict_retry(&self, command: &str) {
        self.command_retries.with_label_values(&[command]).inc();
    }

    pub fn observe_command(&self, command: &str, duration_secs: f64) {
        self.command_duration.with_label_values(&[command]).observe(duration_secs);
    }

    pub fn record_receipt_generated(&self) {
        self.receipts_generated.inc();
    }

    pub fn record_receipt_dead_lettered(&self) {
        self.receipts_dead_lettered.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_value(metrics: &Metrics, name: &str) -> Option<f64> {
        let gathered = metrics.registry().gather();
        let family = gathered.iter().find(|m| m.name() == name)?;
        family.metric[0].counter.value
    }

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        metrics.record_receipt_generated();
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_order_placed() {
        let metrics = Metrics::new().unwrap();
        metrics.record_order_placed("bkash");
        metrics.record_order_placed("bkash");

        assert_eq!(counter_value(&metrics, "fruitmart_orders_placed_total"), Some(2.0));
    }

    #[test]
    fn test_transitions_are_labelled() {
        let metrics = Metrics::new().unwrap();
        metrics.record_status_transition("confirmed");
        metrics.record_status_transition("shipped");
        metrics.record_payment_transition("paid");

        let gathered = metrics.registry().gather();
        let status = gathered
            .iter()
            .find(|m| m.name() == "fruitmart_status_transitions_total")
            .unwrap();
        assert_eq!(status.metric.len(), 2); // Two different status labels
    }

    #[test]
    fn test_receipt_dead_letters() {
        let metrics = Metrics::new().unwrap();
        metrics.record_receipt_dead_lettered();

        assert_eq!(counter_value(&metrics, "fruitmart_receipts_dead_lettered_total"), Some(1.0));
    }
}
