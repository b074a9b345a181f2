use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::pricing::Pricing;
use super::commands::PlaceOrder;
use super::errors::OrderError;
use super::events::OrderPlaced;
use super::value_objects::{OrderItem, OrderNumber};

// ============================================================================
// Order Factory
// ============================================================================
//
// Turns a checkout request into the first event of a new order stream.
// Validation order: items (quantity, price, amounts that fit), then
// shipping address fields in form order. Nothing is produced unless every
// check passes.
//
// ============================================================================

pub fn place_order(command: &PlaceOrder, placed_at: DateTime<Utc>) -> Result<OrderPlaced, OrderError> {
    if command.cart.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let items = command
        .cart
        .items()
        .map(OrderItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let subtotal = items
        .iter()
        .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.line_total))
        .ok_or(OrderError::AmountOverflow)?;

    let shipping_address = command
        .shipping_address
        .normalized()
        .map_err(OrderError::MissingField)?;

    Ok(OrderPlaced {
        order_number: OrderNumber::generate(),
        customer_id: command.customer_id,
        items,
        shipping_address,
        pricing: Pricing::from_subtotal(subtotal),
        payment_method: command.payment_method,
        placed_at,
    })
}
