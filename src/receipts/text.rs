use async_trait::async_trait;
use chrono::Utc;
use std::fmt::Write;

use crate::domain::order::Order;
use super::{Receipt, ReceiptError, ReceiptGenerator};

/// Plain-text receipt renderer
#[derive(Debug, Clone)]
pub struct TextReceiptGenerator {
    shop_name: String,
}

impl TextReceiptGenerator {
    pub fn new(shop_name: impl Into<String>) -> Self {
        Self { shop_name: shop_name.into() }
    }

    fn render(&self, order: &Order) -> Result<String, std::fmt::Error> {
        let mut out = String::new();

        writeln!(out, "{}", self.shop_name)?;
        writeln!(out, "Receipt for order {}", order.order_number)?;
        writeln!(out, "Placed: {}", order.created_at.format("%Y-%m-%d %H:%M UTC"))?;
        writeln!(out)?;

        for item in &order.items {
            writeln!(
                out,
                "{} ({}) x{} @ {} = {}",
                item.name, item.weight, item.quantity, item.unit_price, item.line_total
            )?;
        }
        writeln!(out)?;

        writeln!(out, "Subtotal:     {}", order.pricing.subtotal())?;
        if order.pricing.has_free_delivery() {
            writeln!(out, "Delivery fee: free")?;
        } else {
            writeln!(out, "Delivery fee: {}", order.pricing.delivery_fee())?;
        }
        writeln!(out, "Total:        {}", order.pricing.total())?;
        writeln!(out)?;

        writeln!(out, "Payment: {} ({})", order.payment.method.display_name(), order.payment.status)?;
        if let Some(transaction_id) = &order.payment.transaction_id {
            writeln!(out, "Transaction: {}", transaction_id)?;
        }

        let address = &order.shipping_address;
        writeln!(out)?;
        writeln!(out, "Deliver to: {}, {}", address.full_name, address.phone)?;
        writeln!(out, "{}, {}, {}", address.address_line, address.area, address.city)?;

        Ok(out)
    }
}

impl Default for TextReceiptGenerator {
    fn default() -> Self {
        Self::new("FruitMart")
    }
}

#[async_trait]
impl ReceiptGenerator for TextReceiptGenerator {
    async fn generate(&self, order: &Order) -> Result<Receipt, ReceiptError> {
        let body = self
            .render(order)
            .map_err(|e| ReceiptError::Rejected(e.to_string()))?;

        Ok(Receipt {
            order_number: order.order_number,
            order_version: order.version,
            content_type: "text/plain; charset=utf-8",
            body,
            generated_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::{Cart, CartItem, ProductId};
    use crate::domain::order::{OrderCommandHandler, OrderEvent, PaymentMethod, PlaceOrder, ShippingAddress};
    use crate::domain::pricing::Pricing;
    use crate::event_sourcing::{EventStore, InMemoryEventStore};
    use crate::metrics::Metrics;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_receipt_lists_lines_and_totals() {
        let store: Arc<dyn EventStore<OrderEvent>> = Arc::new(InMemoryEventStore::new());
        let handler = OrderCommandHandler::new(store, Arc::new(Metrics::new().unwrap()));
        let order = handler
            .place(
                PlaceOrder {
                    customer_id: Uuid::new_v4(),
                    cart: Cart::new()
                        .add_item(CartItem::new(ProductId::new("mango"), "Mango", Decimal::from(120), 2))
                        .add_item(CartItem::new(ProductId::new("banana"), "Banana", Decimal::from(60), 1)),
                    shipping_address: ShippingAddress {
                        full_name: "Imran Hossain".to_string(),
                        phone: "01311000000".to_string(),
                        address_line: "44 Zindabazar".to_string(),
                        city: "Sylhet".to_string(),
                        area: "Zindabazar".to_string(),
                        instructions: None,
                    },
                    payment_method: PaymentMethod::CashOnDelivery,
                },
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        let receipt = TextReceiptGenerator::default().generate(&order).await.unwrap();

        assert_eq!(receipt.order_number, order.order_number);
        assert!(receipt.body.contains(&order.order_number.to_string()));
        assert!(receipt.body.contains("Mango () x2 @ 120 = 240"));
        assert!(receipt.body.contains("Delivery fee: 60"));
        assert!(receipt.body.contains("Total:        360"));
        assert!(receipt.body.contains("Cash on Delivery (pending)"));

        let mut bulk = order.clone();
        bulk.pricing = Pricing::from_subtotal(Decimal::from(1200));
        let receipt = TextReceiptGenerator::default().generate(&bulk).await.unwrap();
        assert!(receipt.body.contains("Delivery fee: free"));
    }
}
